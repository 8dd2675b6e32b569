use cosmwasm_std::{coins, Addr, HexBinary, Uint128};
use cw_multi_test::{App, Contract, ContractWrapper, Executor};

use incident_reporting::error::ContractError;
use incident_reporting::msg::{
    ExecuteMsg, InstantiateMsg, PoolResp, QueryMsg, ReportResp,
};
use incident_reporting::state::{IncidentType, ReportStatus, Severity};
use incident_reporting::{execute, instantiate, query};

const DENOM: &str = "uearth";
const REWARD: u128 = 10_000_000;

fn contract() -> Box<dyn Contract<cosmwasm_std::Empty>> {
    Box::new(ContractWrapper::new(execute, instantiate, query))
}

fn setup() -> (App, Addr) {
    let mut app = App::new(|router, _api, storage| {
        router
            .bank
            .init_balance(
                storage,
                &Addr::unchecked("funder"),
                coins(1_000_000_000, DENOM),
            )
            .unwrap();
    });

    let code_id = app.store_code(contract());
    let addr = app
        .instantiate_contract(
            code_id,
            Addr::unchecked("owner"),
            &InstantiateMsg {
                owner: None,
                rangers: Some(vec![
                    "ranger1".to_string(),
                    "ranger2".to_string(),
                    "ranger3".to_string(),
                ]),
                reward_denom: DENOM.to_string(),
                reward_amount: Some(Uint128::new(REWARD)),
                min_verifications: Some(3),
            },
            &[],
            "incident-reporting",
            None,
        )
        .unwrap();
    (app, addr)
}

fn submit(app: &mut App, contract: &Addr, sender: &str, n: u8, anonymous: bool) {
    app.execute_contract(
        Addr::unchecked(sender),
        contract.clone(),
        &ExecuteMsg::SubmitReport {
            content_fingerprint: HexBinary::from([n; 32]),
            incident_type: IncidentType::Wildfire,
            severity: Severity::Critical,
            latitude: 0,
            longitude: 0,
            location_label: "Aberdare Forest".to_string(),
            evidence_fingerprint: None,
            is_anonymous: anonymous,
        },
        &[],
    )
    .unwrap();
}

fn verify_by_quorum(app: &mut App, contract: &Addr, id: u64) {
    for ranger in ["ranger1", "ranger2", "ranger3"] {
        app.execute_contract(
            Addr::unchecked(ranger),
            contract.clone(),
            &ExecuteMsg::VerifyReport {
                id,
                affirm: true,
                notes: Some("confirmed on site".to_string()),
            },
            &[],
        )
        .unwrap();
    }
}

fn balance(app: &App, addr: &str) -> u128 {
    app.wrap().query_balance(addr, DENOM).unwrap().amount.u128()
}

#[test]
fn end_to_end_report_verify_claim() {
    let (mut app, contract) = setup();

    app.execute_contract(
        Addr::unchecked("funder"),
        contract.clone(),
        &ExecuteMsg::AddRewardPool {},
        &coins(5 * REWARD, DENOM),
    )
    .unwrap();
    assert_eq!(balance(&app, contract.as_str()), 5 * REWARD);

    submit(&mut app, &contract, "reporter1", 1, true);
    verify_by_quorum(&mut app, &contract, 1);

    let resp: ReportResp = app
        .wrap()
        .query_wasm_smart(contract.clone(), &QueryMsg::GetReport { id: 1 })
        .unwrap();
    assert_eq!(resp.report.status, ReportStatus::Verified);
    assert_eq!(resp.report.reward_amount, Uint128::new(REWARD));
    assert_eq!(resp.report.submitter, None);

    app.execute_contract(
        Addr::unchecked("reporter1"),
        contract.clone(),
        &ExecuteMsg::ClaimReward {
            id: 1,
            payout_address: "payout".to_string(),
        },
        &[],
    )
    .unwrap();

    assert_eq!(balance(&app, "payout"), REWARD);
    assert_eq!(balance(&app, contract.as_str()), 4 * REWARD);

    let resp: ReportResp = app
        .wrap()
        .query_wasm_smart(contract.clone(), &QueryMsg::GetReport { id: 1 })
        .unwrap();
    assert!(resp.report.reward_claimed);

    let err = app
        .execute_contract(
            Addr::unchecked("reporter1"),
            contract.clone(),
            &ExecuteMsg::ClaimReward {
                id: 1,
                payout_address: "payout".to_string(),
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(
        err.downcast::<ContractError>().unwrap(),
        ContractError::AlreadyClaimed
    );
    assert_eq!(balance(&app, "payout"), REWARD);
}

#[test]
fn escrow_accounting_stays_consistent_across_reports() {
    let (mut app, contract) = setup();

    app.execute_contract(
        Addr::unchecked("funder"),
        contract.clone(),
        &ExecuteMsg::AddRewardPool {},
        &coins(2 * REWARD, DENOM),
    )
    .unwrap();

    submit(&mut app, &contract, "reporter1", 1, false);
    submit(&mut app, &contract, "reporter2", 2, false);
    verify_by_quorum(&mut app, &contract, 1);
    verify_by_quorum(&mut app, &contract, 2);

    let p: PoolResp = app
        .wrap()
        .query_wasm_smart(contract.clone(), &QueryMsg::PoolBalance {})
        .unwrap();
    assert_eq!(p.balance, Uint128::new(2 * REWARD));
    assert_eq!(p.reserved, Uint128::new(2 * REWARD));

    // 予約済みでプールは尽きている。3件目は昇格できない。
    submit(&mut app, &contract, "reporter1", 3, false);
    for ranger in ["ranger1", "ranger2"] {
        app.execute_contract(
            Addr::unchecked(ranger),
            contract.clone(),
            &ExecuteMsg::VerifyReport {
                id: 3,
                affirm: true,
                notes: None,
            },
            &[],
        )
        .unwrap();
    }
    let err = app
        .execute_contract(
            Addr::unchecked("ranger3"),
            contract.clone(),
            &ExecuteMsg::VerifyReport {
                id: 3,
                affirm: true,
                notes: None,
            },
            &[],
        )
        .unwrap_err();
    assert_eq!(
        err.downcast::<ContractError>().unwrap(),
        ContractError::InsufficientRewardPool
    );

    for (id, reporter) in [(1u64, "reporter1"), (2u64, "reporter2")] {
        app.execute_contract(
            Addr::unchecked(reporter),
            contract.clone(),
            &ExecuteMsg::ClaimReward {
                id,
                payout_address: reporter.to_string(),
            },
            &[],
        )
        .unwrap();
    }

    assert_eq!(balance(&app, "reporter1"), REWARD);
    assert_eq!(balance(&app, "reporter2"), REWARD);
    assert_eq!(balance(&app, contract.as_str()), 0);

    let p: PoolResp = app
        .wrap()
        .query_wasm_smart(contract.clone(), &QueryMsg::PoolBalance {})
        .unwrap();
    assert_eq!(p.balance, Uint128::zero());
    assert_eq!(p.reserved, Uint128::zero());
}
