use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, HexBinary, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    pub owner: Addr,

    // 報奨金の設定（denom は instantiate 後に変更不可）
    pub reward_denom: String,
    pub reward_amount: Uint128,

    // Verified 昇格に必要な肯定票の数
    pub min_verifications: u32,

    // 2段階 Owner 移譲
    pub pending_owner: Option<Addr>,
}

pub const CONFIG: Item<Config> = Item::new("config");

#[cw_serde]
pub enum IncidentType {
    IllegalLogging,
    Wildfire,
    Poaching,
    Deforestation,
    Pollution,
    TreeDisease,
    Other,
}

impl IncidentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::IllegalLogging => "illegal_logging",
            IncidentType::Wildfire => "wildfire",
            IncidentType::Poaching => "poaching",
            IncidentType::Deforestation => "deforestation",
            IncidentType::Pollution => "pollution",
            IncidentType::TreeDisease => "tree_disease",
            IncidentType::Other => "other",
        }
    }
}

#[cw_serde]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[cw_serde]
#[derive(Copy)]
pub enum ReportStatus {
    Pending,
    Investigating,
    Verified,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Investigating => "investigating",
            ReportStatus::Verified => "verified",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    /// 手動遷移グラフ。Verified への昇格は verify の quorum のみ。
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, next),
            (Pending, Investigating)
                | (Investigating, Resolved)
                | (Investigating, Dismissed)
                | (Verified, Resolved)
        )
    }
}

#[cw_serde]
pub struct Report {
    pub id: u64,
    pub submitter: Addr,

    // 内容ハッシュ（32 bytes、全レポートで一意）
    pub content_fingerprint: HexBinary,

    pub incident_type: IncidentType,
    pub severity: Severity,

    // マイクロ度（1e6 倍の固定小数点）
    pub latitude: i64,
    pub longitude: i64,
    pub location_label: String,

    // 証拠ハッシュ（空でもよい）
    pub evidence_fingerprint: HexBinary,

    pub is_anonymous: bool,

    pub status: ReportStatus,
    pub verification_count: u32,
    pub reward_amount: Uint128,
    pub reward_claimed: bool,

    pub created_at: u64,
}

pub const REPORT_COUNT: Item<u64> = Item::new("report_count");
pub const REPORTS: Map<u64, Report> = Map::new("reports");

// セカンダリ・インデックス
pub const BY_FINGERPRINT: Map<&[u8], u64> = Map::new("idx_fingerprint"); // content hash -> id
pub const BY_SUBMITTER: Map<(&Addr, u64), ()> = Map::new("idx_submitter"); // (submitter, id)

pub const RANGERS: Map<&Addr, bool> = Map::new("rangers");

// (report id, ranger) -> affirm。存在すること自体が投票済みの印。
pub const VOTES: Map<(u64, &Addr), bool> = Map::new("votes");

// エスクロー残高と、Verified 済み・未請求の予約合計
pub const POOL: Item<Uint128> = Item::new("pool");
pub const RESERVED: Item<Uint128> = Item::new("reserved");
