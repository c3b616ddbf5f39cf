//! # Static Content
//!
//! Fixed page data: downloadable documents, FAQ, collector offices and
//! testimonials, plus the review phases as shown on the process page.

use crate::workflow::Stage;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Document {
    pub title: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub size: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Office {
    pub name: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub hours: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Testimonial {
    pub name: &'static str,
    pub village: &'static str,
    pub message: &'static str,
    /// Out of 5.
    pub rating: u8,
}

/// One committee of the review pipeline, as explained to applicants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub stage: Stage,
    pub label: &'static str,
    pub progress_percentage: u8,
}

pub const DOCUMENTS: [Document; 3] = [
    Document {
        title: "GR - मराठा आरक्षण योजना",
        description: "नवीनतम सरकारी निर्णय",
        kind: "PDF",
        size: "2.5 MB",
        url: "/static/docs/maratha_reservation_gr.pdf",
    },
    Document {
        title: "अर्ज फॉर्म",
        description: "कुणबी प्रमाणपत्रासाठी अर्ज",
        kind: "PDF",
        size: "1.2 MB",
        url: "/static/docs/application_form.pdf",
    },
    Document {
        title: "आवश्यक कागदपत्रांची यादी",
        description: "सर्व आवश्यक दस्तऐवज",
        kind: "PDF",
        size: "800 KB",
        url: "/static/docs/required_documents.pdf",
    },
];

pub const FAQ: [Faq; 4] = [
    Faq {
        question: "कुणबी प्रमाणपत्रासाठी कोण अर्ज करू शकतो?",
        answer: "कुणबी, मराठा-कुणबी किंवा कुणबी-मराठा जातीचे लोक अर्ज करू शकतात. त्यांच्याकडे १३ ऑक्टोबर १९६७ पूर्वीचा निवास दाखला असणे आवश्यक आहे.",
    },
    Faq {
        question: "कोणती कागदपत्रे लागतात?",
        answer: "जन्म प्रमाणपत्र, ७/१२ उतारा, निवासी दाखला, नातेवाईकांचे कुणबी प्रमाणपत्र (असल्यास), शाळा दाखले आणि स्थानीय पुरावे.",
    },
    Faq {
        question: "अर्ज कुठे द्यावा?",
        answer: "ग्रामस्तर समितीकडे अर्ज दाखल करावा. ग्राम महसूल अधिकारी, ग्रामपंचायत अधिकारी यांच्याकडे संपर्क साधा.",
    },
    Faq {
        question: "प्रक्रियेला किती वेळ लागतो?",
        answer: "सामान्यतः ३०-९० दिवस लागतात. ग्राम समिती, तालुका समिती आणि Scrutiny Committee तपासणी केल्यानंतर निर्णय घेतला जातो.",
    },
];

pub const OFFICES: [Office; 2] = [
    Office {
        name: "औरंगाबाद जिल्हा कलेक्टर कार्यालय",
        address: "जिल्हा कलेक्टर कार्यालय, औरंगाबाद",
        phone: "0240-2123456",
        email: "collector.aurangabad@maharashtra.gov.in",
        hours: "सकाळी १०:०० ते संध्याकाळी ५:००",
    },
    Office {
        name: "जालना जिल्हा कलेक्टर कार्यालय",
        address: "जिल्हा कलेक्टर कार्यालय, जालना",
        phone: "02482-123456",
        email: "collector.jalna@maharashtra.gov.in",
        hours: "सकाळी १०:०० ते संध्याकाळी ५:००",
    },
];

pub const TESTIMONIALS: [Testimonial; 2] = [
    Testimonial {
        name: "राहुल पाटील",
        village: "पैठण, औरंगाबाद",
        message: "या वेबसाइटच्या मदतीने मला माझ्या गावातील लाभार्थी सापडले आणि मला आरक्षण मिळाले.",
        rating: 5,
    },
    Testimonial {
        name: "सुनिता जाधव",
        village: "भोकरदन, जालना",
        message: "खूप सोपी प्रक्रिया आणि सर्व माहिती एकाच ठिकाणी मिळते.",
        rating: 5,
    },
];

/// The review committees in order.
#[must_use]
pub fn phases() -> Vec<Phase> {
    Stage::ALL
        .into_iter()
        .map(|stage| Phase {
            stage,
            label: stage.label(),
            progress_percentage: stage.progress_percent(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_serializes_as_type() {
        let json = serde_json::to_value(DOCUMENTS[0]).expect("json");
        assert_eq!(json["type"], "PDF");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn phases_follow_pipeline_order() {
        let phases = phases();
        assert_eq!(phases.len(), 4);
        assert_eq!(phases[0].stage, Stage::GramCommittee);
        assert!(phases.windows(2).all(|w| w[0].progress_percentage < w[1].progress_percentage));
    }

    #[test]
    fn ratings_are_out_of_five() {
        assert!(TESTIMONIALS.iter().all(|t| (1..=5).contains(&t.rating)));
    }
}
