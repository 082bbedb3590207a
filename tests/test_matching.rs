mod common;

use common::{make_deal, setup_with, setup_with_config, test_config, MockOracle};
use dealrank::domain::entities::thesis::{CriterionKind, DealBreaker, ThesisCriteria, ThesisUpdate};
use dealrank::domain::error::DomainError;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const THESIS_TEXT: &str = "We back seed-stage software companies modernising financial infrastructure.";

fn fintech_criteria() -> ThesisCriteria {
    ThesisCriteria {
        sectors: vec!["fintech".into()],
        stages: vec!["series-a".into()],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_sector_deal_breaker_zeroes_score_without_oracle_call() {
    let oracle = Arc::new(MockOracle::default().with_semantic(Some(99.0)));
    let app = setup_with_config(test_config(), oracle.clone(), vec![]);
    let deal = app
        .add_deal(make_deal("Ledgerly", &["fintech"], "seed", "US"))
        .unwrap();
    let thesis = app
        .create_thesis(
            "inv-1",
            "Healthtech only".into(),
            "Digital health platforms for clinicians.".into(),
            ThesisCriteria {
                sectors: vec!["healthtech".into()],
                deal_breakers: vec![DealBreaker::Criterion(CriterionKind::Sector)],
                ..Default::default()
            },
        )
        .unwrap();

    let m = app.match_deal(&thesis.id, &deal.id).await.unwrap();
    assert_eq!(m.match_score, 0.0);
    assert_eq!(m.vetoed_by.as_deref(), Some("sector"));
    assert!(!m.semantic_unavailable);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_flag_deal_breaker_vetoes() {
    let app = setup_with(MockOracle::default(), vec![]);
    let mut deal = make_deal("Burny", &["fintech"], "seed", "US");
    deal.flags = vec!["high-burn".into()];
    let deal = app.add_deal(deal).unwrap();
    let thesis = app
        .create_thesis(
            "inv-1",
            "Capital efficient fintech".into(),
            THESIS_TEXT.into(),
            ThesisCriteria {
                sectors: vec!["fintech".into()],
                deal_breakers: vec![DealBreaker::Flag("High-Burn".into())],
                ..Default::default()
            },
        )
        .unwrap();

    let m = app.match_deal(&thesis.id, &deal.id).await.unwrap();
    assert_eq!(m.match_score, 0.0);
    assert_eq!(m.vetoed_by.as_deref(), Some("flag:High-Burn"));
}

#[tokio::test]
async fn test_blends_criteria_and_semantic() {
    let app = setup_with(MockOracle::default().with_semantic(Some(80.0)), vec![]);
    let deal = app
        .add_deal(make_deal("Ledgerly", &["fintech"], "seed", "US"))
        .unwrap();
    let thesis = app
        .create_thesis("inv-1", "Fintech A".into(), THESIS_TEXT.into(), fintech_criteria())
        .unwrap();

    // criteria 1/2 -> 50; 0.6 * 50 + 0.4 * 80 = 62
    let m = app.match_deal(&thesis.id, &deal.id).await.unwrap();
    assert_eq!(m.match_score, 62.0);
    assert_eq!(m.semantic_similarity, Some(80.0));
    assert!(m.matched_criteria.contains("sector"));
    assert!(!m.matched_criteria.contains("stage"));
}

#[tokio::test]
async fn test_semantic_outage_falls_back_to_criteria() {
    let app = setup_with(MockOracle::default().with_semantic(None), vec![]);
    let deal = app
        .add_deal(make_deal("Ledgerly", &["fintech"], "seed", "US"))
        .unwrap();
    let thesis = app
        .create_thesis("inv-1", "Fintech A".into(), THESIS_TEXT.into(), fintech_criteria())
        .unwrap();

    let m = app.match_deal(&thesis.id, &deal.id).await.unwrap();
    assert_eq!(m.match_score, 50.0);
    assert!(m.semantic_unavailable);
    assert_eq!(m.semantic_similarity, None);
}

#[tokio::test]
async fn test_rematch_replaces_previous_and_top_matches_sorted() {
    let app = setup_with(MockOracle::default().with_semantic(Some(80.0)), vec![]);
    let thesis = app
        .create_thesis("inv-1", "Fintech A".into(), THESIS_TEXT.into(), fintech_criteria())
        .unwrap();
    let seed = app
        .add_deal(make_deal("Seedy", &["fintech"], "seed", "US"))
        .unwrap();
    let series_a = app
        .add_deal(make_deal("Serious", &["fintech"], "series-a", "US"))
        .unwrap();

    app.match_deal(&thesis.id, &seed.id).await.unwrap();
    app.match_deal(&thesis.id, &seed.id).await.unwrap();
    app.match_deal(&thesis.id, &series_a.id).await.unwrap();

    let top = app.top_matches(&thesis.id, 0.0, 10).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].deal_id, series_a.id);
    assert_eq!(top[0].match_score, 92.0);
    assert_eq!(top[1].deal_id, seed.id);

    let above = app.top_matches(&thesis.id, 70.0, 10).unwrap();
    assert_eq!(above.len(), 1);
}

#[tokio::test]
async fn test_inactive_thesis_cannot_match() {
    let app = setup_with(MockOracle::default(), vec![]);
    let deal = app
        .add_deal(make_deal("Ledgerly", &["fintech"], "seed", "US"))
        .unwrap();
    let thesis = app
        .create_thesis("inv-1", "Fintech A".into(), THESIS_TEXT.into(), fintech_criteria())
        .unwrap();
    app.deactivate_thesis(&thesis.id, "inv-1").unwrap();

    let err = app.match_deal(&thesis.id, &deal.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    assert!(app.list_theses("inv-1", false).unwrap().is_empty());
    assert_eq!(app.list_theses("inv-1", true).unwrap().len(), 1);
}

#[tokio::test]
async fn test_thesis_update_owner_only_and_versioned() {
    let app = setup_with(MockOracle::default(), vec![]);
    let thesis = app
        .create_thesis("inv-1", "Fintech A".into(), THESIS_TEXT.into(), fintech_criteria())
        .unwrap();
    assert_eq!(thesis.version, 1);

    let err = app
        .update_thesis(
            &thesis.id,
            "inv-2",
            ThesisUpdate {
                title: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let updated = app
        .update_thesis(
            &thesis.id,
            "inv-1",
            ThesisUpdate {
                title: Some("Fintech A+".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(app.get_thesis(&thesis.id).unwrap().title, "Fintech A+");
}

#[tokio::test]
async fn test_thesis_validation() {
    let app = setup_with(MockOracle::default(), vec![]);
    let err = app
        .create_thesis("inv-1", "".into(), THESIS_TEXT.into(), ThesisCriteria::default())
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "title"));

    let err = app
        .create_thesis(
            "inv-1",
            "Fintech".into(),
            THESIS_TEXT.into(),
            ThesisCriteria {
                min_revenue: Some(-1.0),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn test_matches_grouped_by_thesis_for_investor() {
    let app = setup_with(MockOracle::default(), vec![]);
    let deal = app
        .add_deal(make_deal("Ledgerly", &["fintech"], "seed", "US"))
        .unwrap();
    let criteria = |sector: &str| ThesisCriteria {
        sectors: vec![sector.into()],
        ..Default::default()
    };
    let fintech = app
        .create_thesis("inv-1", "Fintech".into(), THESIS_TEXT.into(), criteria("fintech"))
        .unwrap();
    let health = app
        .create_thesis("inv-1", "Health".into(), THESIS_TEXT.into(), criteria("healthtech"))
        .unwrap();
    let foreign = app
        .create_thesis("inv-2", "Fintech too".into(), THESIS_TEXT.into(), criteria("fintech"))
        .unwrap();
    for thesis in [&fintech, &health, &foreign] {
        app.match_deal(&thesis.id, &deal.id).await.unwrap();
    }

    // 0.6 * 100 + 0.4 * 50 = 80; 0.6 * 0 + 0.4 * 50 = 20
    let strong = app.matches_for_investor("inv-1", 50.0, 10).unwrap();
    assert_eq!(strong.len(), 1);
    assert_eq!(strong[&fintech.id][0].match_score, 80.0);

    app.deactivate_thesis(&health.id, "inv-1").unwrap();
    let all = app.matches_for_investor("inv-1", 0.0, 10).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[&health.id][0].match_score, 20.0);
    assert!(!all.contains_key(&foreign.id));
}
