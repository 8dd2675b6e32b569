use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, HexBinary, Uint128};

use crate::state::{IncidentType, Report, ReportStatus, Severity};

#[cw_serde]
pub struct InstantiateMsg {
    /// 省略時は instantiate の sender
    pub owner: Option<String>,
    pub rangers: Option<Vec<String>>,

    pub reward_denom: String,
    pub reward_amount: Option<Uint128>,
    pub min_verifications: Option<u32>,
}

#[cw_serde]
pub enum ExecuteMsg {
    SubmitReport {
        content_fingerprint: HexBinary,
        incident_type: IncidentType,
        severity: Severity,
        latitude: i64,
        longitude: i64,
        location_label: String,
        evidence_fingerprint: Option<HexBinary>,
        is_anonymous: bool,
    },

    VerifyReport {
        id: u64,
        affirm: bool,
        notes: Option<String>,
    },

    UpdateReportStatus {
        id: u64,
        status: ReportStatus,
    },

    AuthorizeRanger { ranger: String },
    RevokeRanger { ranger: String },

    /// 添付資金をエスクローへ（reward_denom のみ）
    AddRewardPool {},

    ClaimReward {
        id: u64,
        payout_address: String,
    },

    UpdateConfig {
        reward_amount: Option<Uint128>,
        min_verifications: Option<u32>,
    },

    ProposeOwner { new_owner: String },
    AcceptOwner {},
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ReportResp)]
    GetReport { id: u64 },

    #[returns(UserReportsResp)]
    UserReports { submitter: String },

    #[returns(ListReportsResp)]
    ListReports {
        status: Option<ReportStatus>,
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(IsAuthorizedResp)]
    IsAuthorized { addr: String },

    #[returns(PoolResp)]
    PoolBalance {},

    #[returns(ReportCountResp)]
    ReportCount {},

    #[returns(ConfigResp)]
    Config {},
}

/// 公開ビュー。匿名レポートは submitter を伏せる。
#[cw_serde]
pub struct ReportView {
    pub id: u64,
    pub submitter: Option<Addr>,
    pub content_fingerprint: HexBinary,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub latitude: i64,
    pub longitude: i64,
    pub location_label: String,
    pub evidence_fingerprint: HexBinary,
    pub is_anonymous: bool,
    pub status: ReportStatus,
    pub verification_count: u32,
    pub reward_amount: Uint128,
    pub reward_claimed: bool,
    pub created_at: u64,
}

impl From<Report> for ReportView {
    fn from(r: Report) -> Self {
        let submitter = if r.is_anonymous {
            None
        } else {
            Some(r.submitter)
        };
        ReportView {
            id: r.id,
            submitter,
            content_fingerprint: r.content_fingerprint,
            incident_type: r.incident_type,
            severity: r.severity,
            latitude: r.latitude,
            longitude: r.longitude,
            location_label: r.location_label,
            evidence_fingerprint: r.evidence_fingerprint,
            is_anonymous: r.is_anonymous,
            status: r.status,
            verification_count: r.verification_count,
            reward_amount: r.reward_amount,
            reward_claimed: r.reward_claimed,
            created_at: r.created_at,
        }
    }
}

#[cw_serde]
pub struct ReportResp {
    pub report: ReportView,
}

#[cw_serde]
pub struct UserReportsResp {
    pub ids: Vec<u64>,
}

#[cw_serde]
pub struct ListReportsResp {
    pub reports: Vec<ReportView>,
    pub next_start_after: Option<u64>,
}

#[cw_serde]
pub struct IsAuthorizedResp {
    pub authorized: bool,
}

#[cw_serde]
pub struct PoolResp {
    pub balance: Uint128,
    pub reserved: Uint128,
}

#[cw_serde]
pub struct ReportCountResp {
    pub count: u64,
}

#[cw_serde]
pub struct ConfigResp {
    pub owner: String,
    pub reward_denom: String,
    pub reward_amount: Uint128,
    pub min_verifications: u32,
    pub pending_owner: Option<String>,
}
