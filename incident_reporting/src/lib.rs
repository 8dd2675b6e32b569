#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;

use cosmwasm_std::{
    coin, to_json_binary, Addr, BankMsg, Binary, Deps, DepsMut, Env, HexBinary, MessageInfo, Order,
    Response, StdError, StdResult, Uint128,
};
use cw2::set_contract_version;
use cw_storage_plus::Bound;

pub mod error;
pub mod msg;
pub mod state;


use crate::error::ContractError;
use crate::msg::{
    ConfigResp, ExecuteMsg, InstantiateMsg, IsAuthorizedResp, ListReportsResp, PoolResp,
    QueryMsg, ReportCountResp, ReportResp, ReportView, UserReportsResp,
};
use crate::state::{
    Config, IncidentType, Report, ReportStatus, Severity, BY_FINGERPRINT, BY_SUBMITTER, CONFIG,
    POOL, RANGERS, REPORTS, REPORT_COUNT, RESERVED, VOTES,
};

const CONTRACT_NAME: &str = "crates.io:incident_reporting";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const FINGERPRINT_LEN: usize = 32;
const MAX_LABEL_LEN: usize = 256;

// 緯度経度はマイクロ度（1e6 倍）
const LAT_LIMIT: i64 = 90_000_000;
const LON_LIMIT: i64 = 180_000_000;

const DEFAULT_MIN_VERIFICATIONS: u32 = 3;
const DEFAULT_REWARD_AMOUNT: Uint128 = Uint128::new(10_000_000);

const MAX_LIMIT: u32 = 1_000;
const DEFAULT_LIMIT: u32 = 100;

/* ===========================
 * role helpers
 * =========================== */

fn ensure_owner(cfg: &Config, sender: &Addr) -> Result<(), ContractError> {
    if &cfg.owner != sender {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

fn ensure_ranger(deps: &DepsMut, sender: &Addr) -> Result<(), ContractError> {
    let ok = RANGERS.may_load(deps.storage, sender)?.unwrap_or(false);
    if !ok {
        return Err(ContractError::NotAuthorizedRanger);
    }
    Ok(())
}

fn load_report(deps: &DepsMut, id: u64) -> Result<Report, ContractError> {
    REPORTS
        .may_load(deps.storage, id)?
        .ok_or(ContractError::NotFound { id })
}

/* ===========================
 * entry points
 * =========================== */

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    if msg.reward_denom.trim().is_empty() {
        return Err(ContractError::BadRequest {
            msg: "reward_denom is required".into(),
        });
    }

    let reward_amount = msg.reward_amount.unwrap_or(DEFAULT_REWARD_AMOUNT);
    if reward_amount.is_zero() {
        return Err(ContractError::BadRequest {
            msg: "reward_amount must be > 0".into(),
        });
    }

    let min_verifications = msg.min_verifications.unwrap_or(DEFAULT_MIN_VERIFICATIONS);
    if min_verifications == 0 {
        return Err(ContractError::BadRequest {
            msg: "min_verifications must be > 0".into(),
        });
    }

    let owner = match msg.owner {
        Some(o) => deps.api.addr_validate(&o)?,
        None => info.sender.clone(),
    };

    let cfg = Config {
        owner: owner.clone(),
        reward_denom: msg.reward_denom,
        reward_amount,
        min_verifications,
        pending_owner: None,
    };
    CONFIG.save(deps.storage, &cfg)?;

    if let Some(rs) = msg.rangers {
        for r in rs {
            let addr = deps.api.addr_validate(&r)?;
            RANGERS.save(deps.storage, &addr, &true)?;
        }
    }

    REPORT_COUNT.save(deps.storage, &0)?;
    POOL.save(deps.storage, &Uint128::zero())?;
    RESERVED.save(deps.storage, &Uint128::zero())?;
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("owner", owner)
        .add_attribute("reward_amount", reward_amount)
        .add_attribute("min_verifications", min_verifications.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::SubmitReport {
            content_fingerprint,
            incident_type,
            severity,
            latitude,
            longitude,
            location_label,
            evidence_fingerprint,
            is_anonymous,
        } => exec_submit_report(
            deps,
            env,
            info,
            content_fingerprint,
            incident_type,
            severity,
            latitude,
            longitude,
            location_label,
            evidence_fingerprint,
            is_anonymous,
        ),
        ExecuteMsg::VerifyReport { id, affirm, notes } => {
            exec_verify_report(deps, env, info, id, affirm, notes)
        }
        ExecuteMsg::UpdateReportStatus { id, status } => {
            exec_update_report_status(deps, env, info, id, status)
        }
        ExecuteMsg::AuthorizeRanger { ranger } => exec_set_ranger(deps, info, ranger, true),
        ExecuteMsg::RevokeRanger { ranger } => exec_set_ranger(deps, info, ranger, false),
        ExecuteMsg::AddRewardPool {} => exec_add_reward_pool(deps, info),
        ExecuteMsg::ClaimReward { id, payout_address } => {
            exec_claim_reward(deps, info, id, payout_address)
        }
        ExecuteMsg::UpdateConfig {
            reward_amount,
            min_verifications,
        } => exec_update_config(deps, info, reward_amount, min_verifications),
        ExecuteMsg::ProposeOwner { new_owner } => exec_propose_owner(deps, info, new_owner),
        ExecuteMsg::AcceptOwner {} => exec_accept_owner(deps, info),
    }
}

/* ===========================
 * report ledger
 * =========================== */

#[allow(clippy::too_many_arguments)]
fn exec_submit_report(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    content_fingerprint: HexBinary,
    incident_type: IncidentType,
    severity: Severity,
    latitude: i64,
    longitude: i64,
    location_label: String,
    evidence_fingerprint: Option<HexBinary>,
    is_anonymous: bool,
) -> Result<Response, ContractError> {
    // 投稿に資金は受け取らない
    if !info.funds.is_empty() {
        return Err(ContractError::BadRequest {
            msg: "submit_report does not accept funds".into(),
        });
    }

    if !(-LAT_LIMIT..=LAT_LIMIT).contains(&latitude)
        || !(-LON_LIMIT..=LON_LIMIT).contains(&longitude)
    {
        return Err(ContractError::InvalidCoordinates);
    }

    if content_fingerprint.len() != FINGERPRINT_LEN {
        return Err(ContractError::BadRequest {
            msg: "content_fingerprint must be 32 bytes".into(),
        });
    }
    if content_fingerprint.as_slice().iter().all(|b| *b == 0) {
        return Err(ContractError::BadRequest {
            msg: "content_fingerprint must not be zero".into(),
        });
    }

    let evidence_fingerprint = evidence_fingerprint.unwrap_or_default();
    if !evidence_fingerprint.is_empty() && evidence_fingerprint.len() != FINGERPRINT_LEN {
        return Err(ContractError::BadRequest {
            msg: "evidence_fingerprint must be empty or 32 bytes".into(),
        });
    }

    if location_label.len() > MAX_LABEL_LEN {
        return Err(ContractError::BadRequest {
            msg: "location_label too long".into(),
        });
    }

    if BY_FINGERPRINT.has(deps.storage, content_fingerprint.as_slice()) {
        return Err(ContractError::DuplicateReport);
    }

    let id = REPORT_COUNT.load(deps.storage)? + 1;
    let created_at = env.block.time.seconds();

    let report = Report {
        id,
        submitter: info.sender.clone(),
        content_fingerprint: content_fingerprint.clone(),
        incident_type: incident_type.clone(),
        severity: severity.clone(),
        latitude,
        longitude,
        location_label,
        evidence_fingerprint,
        is_anonymous,
        status: ReportStatus::Pending,
        verification_count: 0,
        reward_amount: Uint128::zero(),
        reward_claimed: false,
        created_at,
    };

    REPORTS.save(deps.storage, id, &report)?;
    BY_FINGERPRINT.save(deps.storage, content_fingerprint.as_slice(), &id)?;
    BY_SUBMITTER.save(deps.storage, (&info.sender, id), &())?;
    REPORT_COUNT.save(deps.storage, &id)?;

    Ok(Response::new()
        .add_attribute("action", "incident_reported")
        .add_attribute("id", id.to_string())
        .add_attribute("content_fingerprint", content_fingerprint.to_string())
        .add_attribute("incident_type", incident_type.as_str())
        .add_attribute("severity", severity.as_str())
        .add_attribute("is_anonymous", is_anonymous.to_string())
        .add_attribute("timestamp", created_at.to_string()))
}

/* ===========================
 * verification / consensus
 * =========================== */

fn exec_verify_report(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    id: u64,
    affirm: bool,
    notes: Option<String>,
) -> Result<Response, ContractError> {
    ensure_ranger(&deps, &info.sender)?;
    let mut report = load_report(&deps, id)?;

    if VOTES.has(deps.storage, (id, &info.sender)) {
        return Err(ContractError::AlreadyVoted);
    }

    if affirm {
        report.verification_count += 1;
    }

    let now = env.block.time.seconds();
    let mut resp = Response::new()
        .add_attribute("action", "report_verified")
        .add_attribute("id", id.to_string())
        .add_attribute("ranger", info.sender.clone())
        .add_attribute("affirm", affirm.to_string())
        .add_attribute("timestamp", now.to_string());
    if let Some(n) = notes {
        resp = resp.add_attribute("notes", n);
    }

    // quorum 到達で Verified へ昇格し、報奨金を予約する。
    // 票の記録・昇格・予約は同一 execute 内の単一ステップ。
    // 書き込みは全チェック通過後（エラー時に中途状態を残さない）。
    let cfg = CONFIG.load(deps.storage)?;
    let promote = affirm
        && report.verification_count >= cfg.min_verifications
        && matches!(
            report.status,
            ReportStatus::Pending | ReportStatus::Investigating
        );

    if promote {
        let pool = POOL.load(deps.storage)?;
        let reserved = RESERVED.load(deps.storage)?;
        let available = pool.checked_sub(reserved).map_err(StdError::overflow)?;
        if available < cfg.reward_amount {
            return Err(ContractError::InsufficientRewardPool);
        }

        let old = report.status;
        report.status = ReportStatus::Verified;
        report.reward_amount = cfg.reward_amount;
        RESERVED.save(deps.storage, &(reserved + cfg.reward_amount))?;

        resp = resp
            .add_attribute("old_status", old.as_str())
            .add_attribute("new_status", ReportStatus::Verified.as_str())
            .add_attribute("reward_amount", cfg.reward_amount);
    }

    VOTES.save(deps.storage, (id, &info.sender), &affirm)?;
    REPORTS.save(deps.storage, id, &report)?;
    Ok(resp)
}

/* ===========================
 * status lifecycle
 * =========================== */

fn exec_update_report_status(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    id: u64,
    status: ReportStatus,
) -> Result<Response, ContractError> {
    ensure_ranger(&deps, &info.sender)?;
    let mut report = load_report(&deps, id)?;

    let old = report.status;
    if !old.can_transition_to(status) {
        return Err(ContractError::InvalidTransition {
            from: old,
            to: status,
        });
    }
    report.status = status;
    REPORTS.save(deps.storage, id, &report)?;

    Ok(Response::new()
        .add_attribute("action", "report_status_updated")
        .add_attribute("id", id.to_string())
        .add_attribute("old_status", old.as_str())
        .add_attribute("new_status", status.as_str())
        .add_attribute("timestamp", env.block.time.seconds().to_string()))
}

/* ===========================
 * ranger registry
 * =========================== */

fn exec_set_ranger(
    deps: DepsMut,
    info: MessageInfo,
    ranger: String,
    enabled: bool,
) -> Result<Response, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;
    ensure_owner(&cfg, &info.sender)?;

    let addr = deps.api.addr_validate(&ranger)?;
    RANGERS.save(deps.storage, &addr, &enabled)?;

    let action = if enabled {
        "ranger_authorized"
    } else {
        "ranger_revoked"
    };
    Ok(Response::new()
        .add_attribute("action", action)
        .add_attribute("ranger", addr))
}

/* ===========================
 * reward escrow
 * =========================== */

fn exec_add_reward_pool(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let cfg = CONFIG.load(deps.storage)?;

    // reward_denom のみ集計（他 denom の添付は拒否）
    let mut amount = Uint128::zero();
    for c in &info.funds {
        if c.denom == cfg.reward_denom {
            amount += c.amount;
        } else {
            return Err(ContractError::BadRequest {
                msg: format!("only {} accepted", cfg.reward_denom),
            });
        }
    }
    if amount.is_zero() {
        return Err(ContractError::BadRequest {
            msg: "contribution must be > 0".into(),
        });
    }

    let balance = POOL.load(deps.storage)? + amount;
    POOL.save(deps.storage, &balance)?;

    Ok(Response::new()
        .add_attribute("action", "reward_pool_funded")
        .add_attribute("from", info.sender)
        .add_attribute("amount", amount)
        .add_attribute("balance", balance))
}

fn exec_claim_reward(
    deps: DepsMut,
    info: MessageInfo,
    id: u64,
    payout_address: String,
) -> Result<Response, ContractError> {
    let mut report = load_report(&deps, id)?;

    if !matches!(
        report.status,
        ReportStatus::Verified | ReportStatus::Resolved
    ) {
        return Err(ContractError::ReportNotVerified);
    }
    if report.reward_claimed {
        return Err(ContractError::AlreadyClaimed);
    }
    if report.submitter != info.sender {
        return Err(ContractError::NotReportOwner);
    }

    let payout = deps.api.addr_validate(&payout_address)?;
    let amount = report.reward_amount;

    report.reward_claimed = true;
    REPORTS.save(deps.storage, id, &report)?;

    let pool = POOL.load(deps.storage)?;
    POOL.save(
        deps.storage,
        &pool.checked_sub(amount).map_err(StdError::overflow)?,
    )?;
    let reserved = RESERVED.load(deps.storage)?;
    RESERVED.save(
        deps.storage,
        &reserved.checked_sub(amount).map_err(StdError::overflow)?,
    )?;

    let cfg = CONFIG.load(deps.storage)?;
    // 送金失敗時はトランザクションごと巻き戻る（claimed は残らない）
    let bank_msg = BankMsg::Send {
        to_address: payout.to_string(),
        amount: vec![coin(amount.u128(), &cfg.reward_denom)],
    };

    Ok(Response::new()
        .add_message(bank_msg)
        .add_attribute("action", "reward_claimed")
        .add_attribute("id", id.to_string())
        .add_attribute("payout_address", payout)
        .add_attribute("amount", amount))
}

/* ===========================
 * config / owner handover
 * =========================== */

fn exec_update_config(
    deps: DepsMut,
    info: MessageInfo,
    reward_amount: Option<Uint128>,
    min_verifications: Option<u32>,
) -> Result<Response, ContractError> {
    CONFIG.update(deps.storage, |mut cfg| -> Result<_, ContractError> {
        ensure_owner(&cfg, &info.sender)?;

        if let Some(am) = reward_amount {
            if am.is_zero() {
                return Err(ContractError::BadRequest {
                    msg: "reward_amount must be > 0".into(),
                });
            }
            cfg.reward_amount = am;
        }
        if let Some(mv) = min_verifications {
            if mv == 0 {
                return Err(ContractError::BadRequest {
                    msg: "min_verifications must be > 0".into(),
                });
            }
            cfg.min_verifications = mv;
        }
        Ok(cfg)
    })?;

    Ok(Response::new().add_attribute("action", "update_config"))
}

fn exec_propose_owner(
    deps: DepsMut,
    info: MessageInfo,
    new_owner: String,
) -> Result<Response, ContractError> {
    CONFIG.update(deps.storage, |mut cfg| -> Result<_, ContractError> {
        ensure_owner(&cfg, &info.sender)?;
        cfg.pending_owner = Some(deps.api.addr_validate(&new_owner)?);
        Ok(cfg)
    })?;
    Ok(Response::new().add_attribute("action", "propose_owner"))
}

fn exec_accept_owner(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    CONFIG.update(deps.storage, |mut cfg| -> Result<_, ContractError> {
        let Some(p) = &cfg.pending_owner else {
            return Err(ContractError::NoPendingOwner);
        };
        if p != &info.sender {
            return Err(ContractError::Unauthorized);
        }
        cfg.owner = info.sender.clone();
        cfg.pending_owner = None;
        Ok(cfg)
    })?;
    Ok(Response::new().add_attribute("action", "accept_owner"))
}

/* ============== query entry ============== */

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::GetReport { id } => to_json_binary(&query_get_report(deps, id)?),
        QueryMsg::UserReports { submitter } => {
            to_json_binary(&query_user_reports(deps, submitter)?)
        }
        QueryMsg::ListReports {
            status,
            start_after,
            limit,
        } => to_json_binary(&query_list_reports(deps, status, start_after, limit)?),
        QueryMsg::IsAuthorized { addr } => to_json_binary(&query_is_authorized(deps, addr)?),
        QueryMsg::PoolBalance {} => to_json_binary(&query_pool_balance(deps)?),
        QueryMsg::ReportCount {} => to_json_binary(&ReportCountResp {
            count: REPORT_COUNT.load(deps.storage)?,
        }),
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
    }
}

fn query_get_report(deps: Deps, id: u64) -> StdResult<ReportResp> {
    let report = REPORTS
        .may_load(deps.storage, id)?
        .ok_or_else(|| StdError::not_found("report"))?;
    Ok(ReportResp {
        report: report.into(),
    })
}

fn query_user_reports(deps: Deps, submitter: String) -> StdResult<UserReportsResp> {
    let addr = deps.api.addr_validate(&submitter)?;
    let ids = BY_SUBMITTER
        .prefix(&addr)
        .keys(deps.storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<u64>>>()?;
    Ok(UserReportsResp { ids })
}

fn query_list_reports(
    deps: Deps,
    status: Option<ReportStatus>,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<ListReportsResp> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_bound = start_after.map(Bound::exclusive);

    let mut out: Vec<ReportView> = Vec::with_capacity(limit);
    let mut last_id: Option<u64> = None;

    for item in REPORTS.range(deps.storage, start_bound, None, Order::Ascending) {
        let (id, report) = item?;
        if let Some(s) = &status {
            if &report.status != s {
                continue;
            }
        }
        last_id = Some(id);
        out.push(report.into());
        if out.len() == limit {
            break;
        }
    }

    let next = if out.len() == limit { last_id } else { None };
    Ok(ListReportsResp {
        reports: out,
        next_start_after: next,
    })
}

fn query_is_authorized(deps: Deps, addr: String) -> StdResult<IsAuthorizedResp> {
    let addr = deps.api.addr_validate(&addr)?;
    let authorized = RANGERS.may_load(deps.storage, &addr)?.unwrap_or(false);
    Ok(IsAuthorizedResp { authorized })
}

fn query_pool_balance(deps: Deps) -> StdResult<PoolResp> {
    Ok(PoolResp {
        balance: POOL.load(deps.storage)?,
        reserved: RESERVED.load(deps.storage)?,
    })
}

fn query_config(deps: Deps) -> StdResult<ConfigResp> {
    let cfg = CONFIG.load(deps.storage)?;
    Ok(ConfigResp {
        owner: cfg.owner.to_string(),
        reward_denom: cfg.reward_denom,
        reward_amount: cfg.reward_amount,
        min_verifications: cfg.min_verifications,
        pending_owner: cfg.pending_owner.as_ref().map(|a| a.to_string()),
    })
}
