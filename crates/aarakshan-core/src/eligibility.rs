//! # Eligibility Questionnaire
//!
//! Decision table behind the "am I eligible for a Kunbi certificate?" check.
//!
//! Six answers go in; a yes/no verdict and a list of reasons come out.
//! Every failing rule is reported, so the applicant sees everything that is
//! missing at once:
//!
//! 1. proof of residence from before 13 October 1967 is mandatory;
//! 2. the caste records must mention Kunbi ("Maratha" alone is not enough);
//! 3. at least one piece of evidence: Kunbi relatives, a gazette entry,
//!    land records or school records.
//!
//! An eligible verdict carries one guidance line: relatives' certificates and
//! gazette entries count as strong evidence, the rest as weak.

use crate::error::{PortalError, Result};
use serde::{Deserialize, Serialize};

/// Yes/no answer to a questionnaire item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Answer::Yes
    }
}

/// Caste as written in the applicant's old records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasteRecord {
    Kunbi,
    #[serde(alias = "maratha-kunbi")]
    MarathaKunbi,
    #[serde(alias = "kunbi-maratha")]
    KunbiMaratha,
    Maratha,
    Other,
}

/// Language of the reason texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Marathi (the portal's default).
    #[default]
    #[serde(alias = "mr")]
    Marathi,
    #[serde(alias = "en")]
    English,
}

/// The six answers, as submitted. Missing answers are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub residence_proof: Option<Answer>,
    pub kunbi_relatives: Option<Answer>,
    pub land_records: Option<Answer>,
    pub school_records: Option<Answer>,
    pub caste_records: Option<CasteRecord>,
    pub gazette_record: Option<Answer>,
}

/// Why a verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    ResidenceProofRequired,
    MarathaAloneInsufficient,
    KunbiMentionRequired,
    EvidenceRequired,
    StrongEvidence,
    SeekStrongerEvidence,
}

impl Reason {
    /// Text shown to the applicant.
    #[must_use]
    pub const fn message(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Reason::ResidenceProofRequired, Locale::Marathi) => {
                "१३ ऑक्टोबर १९६७ पूर्वीचा वास्तव्य पुरावा अनिवार्य आहे"
            }
            (Reason::ResidenceProofRequired, Locale::English) => {
                "Proof of residence from before 13 October 1967 is mandatory"
            }
            (Reason::MarathaAloneInsufficient, Locale::Marathi) => {
                "फक्त \"मराठा\" जात पुरेशी नाही - \"कुणबी\" उल्लेख आवश्यक"
            }
            (Reason::MarathaAloneInsufficient, Locale::English) => {
                "\"Maratha\" alone is not enough - the records must mention \"Kunbi\""
            }
            (Reason::KunbiMentionRequired, Locale::Marathi) => {
                "कागदपत्रांमध्ये कुणबी/मराठा-कुणबी नमूद असणे आवश्यक"
            }
            (Reason::KunbiMentionRequired, Locale::English) => {
                "The documents must mention Kunbi or Maratha-Kunbi"
            }
            (Reason::EvidenceRequired, Locale::Marathi) => {
                "कमीत कमी एक पुरावा आवश्यक: नातेवाईकांचे प्रमाणपत्र, गॅझेट नोंद, जमीन कागदपत्रे किंवा शाळा दाखले"
            }
            (Reason::EvidenceRequired, Locale::English) => {
                "At least one piece of evidence is required: a relative's certificate, a gazette entry, land records or school records"
            }
            (Reason::StrongEvidence, Locale::Marathi) => "तुमच्याकडे मजबूत पुरावे आहेत",
            (Reason::StrongEvidence, Locale::English) => "You have strong evidence",
            (Reason::SeekStrongerEvidence, Locale::Marathi) => {
                "अधिक मजबूत पुरावे (गॅझेट नोंद/नातेवाईकांचे प्रमाणपत्र) मिळवण्याचा प्रयत्न करा"
            }
            (Reason::SeekStrongerEvidence, Locale::English) => {
                "Try to obtain stronger evidence (a gazette entry or a relative's certificate)"
            }
        }
    }
}

/// Result of the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub eligible: bool,
    pub reasons: Vec<Reason>,
}

impl Verdict {
    /// Reason texts in the requested language.
    #[must_use]
    pub fn messages(&self, locale: Locale) -> Vec<&'static str> {
        self.reasons.iter().map(|r| r.message(locale)).collect()
    }
}

impl Questionnaire {
    /// Names of unanswered questions, in form order.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let answers = [
            ("residence_proof", self.residence_proof.is_some()),
            ("kunbi_relatives", self.kunbi_relatives.is_some()),
            ("land_records", self.land_records.is_some()),
            ("school_records", self.school_records.is_some()),
            ("caste_records", self.caste_records.is_some()),
            ("gazette_record", self.gazette_record.is_some()),
        ];
        for (name, answered) in answers {
            if !answered {
                missing.push(name);
            }
        }
        missing
    }
}

/// Run the decision table. Every question must be answered.
pub fn evaluate(answers: &Questionnaire) -> Result<Verdict> {
    let missing = answers.missing();
    if !missing.is_empty() {
        return Err(PortalError::Validation(format!(
            "unanswered questions: {}",
            missing.join(", ")
        )));
    }

    let yes = |a: Option<Answer>| a.is_some_and(Answer::is_yes);
    let mut reasons = Vec::new();

    if !yes(answers.residence_proof) {
        reasons.push(Reason::ResidenceProofRequired);
    }

    match answers.caste_records {
        Some(CasteRecord::Maratha) => reasons.push(Reason::MarathaAloneInsufficient),
        Some(CasteRecord::Other) => reasons.push(Reason::KunbiMentionRequired),
        _ => {}
    }

    let strong = yes(answers.kunbi_relatives) || yes(answers.gazette_record);
    let weak = yes(answers.land_records) || yes(answers.school_records);
    if !strong && !weak {
        reasons.push(Reason::EvidenceRequired);
    }

    let eligible = reasons.is_empty();
    if eligible {
        reasons.push(if strong {
            Reason::StrongEvidence
        } else {
            Reason::SeekStrongerEvidence
        });
    }

    Ok(Verdict { eligible, reasons })
}

// =============================================================================
// TESTS
// =============================================================================
