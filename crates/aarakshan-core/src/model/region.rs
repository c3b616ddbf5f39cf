//! Administrative hierarchy: division → district → village.

use super::record;
use crate::{DistrictId, DivisionId, VillageId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub id: DivisionId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub division_id: DivisionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Village {
    pub id: VillageId,
    pub name: String,
    pub district_id: DistrictId,
}

record!(Division, Divisions);
record!(District, Districts);
record!(Village, Villages);
