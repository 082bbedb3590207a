mod common;

use common::{add_deal, setup, setup_with, setup_with_config, test_config, MockOracle};
use dealrank::domain::entities::batch_job::{ItemOutput, ItemStatus, JobSpec, CANCELLED_REASON};
use dealrank::domain::entities::thesis::ThesisCriteria;
use dealrank::domain::error::DomainError;
use dealrank::domain::values::job_state::{JobKind, JobState};
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(10);

fn score_spec(investor: &str, targets: Vec<String>) -> JobSpec {
    JobSpec {
        kind: JobKind::Score,
        investor_id: investor.into(),
        thesis_id: None,
        target_ids: targets,
    }
}

#[tokio::test]
async fn test_item_failure_does_not_fail_job() {
    let app = setup_with(MockOracle::default().failing_for("Second"), vec![]);
    let ids: Vec<String> = ["First", "Second", "Third"]
        .iter()
        .map(|n| add_deal(&app, n).id)
        .collect();

    let job_id = app.submit_batch_job(score_spec("inv-1", ids.clone())).await.unwrap();
    let job = app.wait_for_job(&job_id, POLL).await.unwrap();

    assert_eq!(job.state, JobState::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.succeeded_count(), 2);
    assert_eq!(job.failed_count(), 1);
    assert!(matches!(job.items[1].status, ItemStatus::Failed { .. }));
    assert_eq!(job.items[1].target_id, ids[1]);
    assert!(matches!(
        job.items[0].status,
        ItemStatus::Succeeded {
            output: ItemOutput::Score { value: 70, .. }
        }
    ));
    // successful items were recorded to history
    assert!(app.current_score(&ids[0], "inv-1").unwrap().is_some());
    assert!(app.current_score(&ids[1], "inv-1").unwrap().is_none());
}

#[tokio::test]
async fn test_empty_submission_rejected() {
    let app = setup();
    let err = app.submit_batch_job(score_spec("inv-1", vec![])).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
    assert!(app.list_jobs(None).unwrap().is_empty());
}

#[tokio::test]
async fn test_match_job_requires_thesis() {
    let app = setup();
    let deal = add_deal(&app, "Ledgerly");
    let err = app
        .submit_batch_job(JobSpec {
            kind: JobKind::Match,
            investor_id: "inv-1".into(),
            thesis_id: None,
            target_ids: vec![deal.id],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "thesis_id"));
}

#[tokio::test]
async fn test_unknown_thesis_fails_job_before_items() {
    let app = setup();
    let deal = add_deal(&app, "Ledgerly");
    let job_id = app
        .submit_batch_job(JobSpec {
            kind: JobKind::Match,
            investor_id: "inv-1".into(),
            thesis_id: Some("missing".into()),
            target_ids: vec![deal.id],
        })
        .await
        .unwrap();

    let job = app.wait_for_job(&job_id, POLL).await.unwrap();
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.progress, 0);
    assert_eq!(job.items[0].status, ItemStatus::Skipped);
    assert!(job.failure_reason.unwrap().contains("missing"));
}

#[tokio::test]
async fn test_match_job_records_matches() {
    let app = setup_with(MockOracle::default().with_semantic(Some(80.0)), vec![]);
    let a = add_deal(&app, "A");
    let b = add_deal(&app, "B");
    let thesis = app
        .create_thesis(
            "inv-1",
            "Fintech".into(),
            "Seed-stage fintech infrastructure.".into(),
            ThesisCriteria {
                sectors: vec!["fintech".into()],
                ..Default::default()
            },
        )
        .unwrap();

    let job_id = app
        .submit_batch_job(JobSpec {
            kind: JobKind::Match,
            investor_id: "inv-1".into(),
            thesis_id: Some(thesis.id.clone()),
            target_ids: vec![a.id, b.id],
        })
        .await
        .unwrap();
    let job = app.wait_for_job(&job_id, POLL).await.unwrap();

    assert_eq!(job.state, JobState::Completed);
    assert_eq!(app.top_matches(&thesis.id, 0.0, 10).unwrap().len(), 2);
    // 0.6 * 100 + 0.4 * 80
    assert!(matches!(
        job.items[0].status,
        ItemStatus::Succeeded {
            output: ItemOutput::Match { match_score, vetoed: false }
        } if match_score == 92.0
    ));
}

#[tokio::test]
async fn test_cancellation_skips_unstarted_items() {
    let mut config = test_config();
    config.batch_concurrency = 1;
    let oracle = Arc::new(MockOracle::default().with_delay(Duration::from_millis(200)));
    let app = setup_with_config(config, oracle, vec![]);
    let ids: Vec<String> = (0..4).map(|i| add_deal(&app, &format!("Deal {i}")).id).collect();

    let job_id = app.submit_batch_job(score_spec("inv-1", ids)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = app.cancel_job(&job_id, "someone-else").unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    app.cancel_job(&job_id, "inv-1").unwrap();
    let job = app.wait_for_job(&job_id, POLL).await.unwrap();

    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.failure_reason.as_deref(), Some(CANCELLED_REASON));
    assert!(job.cancel_requested);
    // the in-flight item finished, nothing after it started
    assert_eq!(job.succeeded_count(), 1);
    assert_eq!(
        job.items
            .iter()
            .filter(|i| i.status == ItemStatus::Skipped)
            .count(),
        3
    );
    assert!(job.progress < 100);

    let err = app.cancel_job(&job_id, "inv-1").unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn test_progress_is_monotone_and_100_only_when_completed() {
    let mut config = test_config();
    config.batch_concurrency = 2;
    let oracle = Arc::new(MockOracle::default().with_delay(Duration::from_millis(20)));
    let app = setup_with_config(config, oracle, vec![]);
    let ids: Vec<String> = (0..6).map(|i| add_deal(&app, &format!("Deal {i}")).id).collect();

    let job_id = app.submit_batch_job(score_spec("inv-1", ids)).await.unwrap();
    let mut last = 0;
    loop {
        let job = app.job_status(&job_id).unwrap();
        assert!(job.progress >= last, "progress went backwards");
        assert_eq!(job.progress == 100, job.state == JobState::Completed);
        last = job.progress;
        if job.state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(last, 100);
}

#[tokio::test]
async fn test_remove_job_only_when_terminal() {
    let oracle = Arc::new(MockOracle::default().with_delay(Duration::from_millis(100)));
    let app = setup_with_config(test_config(), oracle, vec![]);
    let deal = add_deal(&app, "Ledgerly");

    let job_id = app
        .submit_batch_job(score_spec("inv-1", vec![deal.id]))
        .await
        .unwrap();
    let err = app.remove_job(&job_id).unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    app.wait_for_job(&job_id, POLL).await.unwrap();
    app.remove_job(&job_id).unwrap();
    assert!(matches!(app.job_status(&job_id), Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_recalculate_covers_every_deal() {
    let app = setup();
    for name in ["A", "B", "C"] {
        add_deal(&app, name);
    }
    let job_id = app.recalculate_all("inv-1").await.unwrap();
    let job = app.wait_for_job(&job_id, POLL).await.unwrap();
    assert_eq!(job.kind, JobKind::Recalculate);
    assert_eq!(job.items.len(), 3);
    assert_eq!(job.succeeded_count(), 3);
    assert_eq!(app.list_jobs(Some("inv-1")).unwrap().len(), 1);
    assert!(app.list_jobs(Some("inv-2")).unwrap().is_empty());
}

#[tokio::test]
async fn test_low_scores_in_batch_create_alerts() {
    let app = setup_with(
        MockOracle {
            default_scores: dealrank::domain::values::sub_scores::SubScoreSet::new(30.0, 30.0, 30.0, 30.0),
            ..Default::default()
        },
        vec![],
    );
    let deal = add_deal(&app, "Weak");
    let job_id = app
        .submit_batch_job(score_spec("inv-1", vec![deal.id]))
        .await
        .unwrap();
    let job = app.wait_for_job(&job_id, POLL).await.unwrap();
    assert!(matches!(
        job.items[0].status,
        ItemStatus::Succeeded {
            output: ItemOutput::Score { value: 30, alerts_created: 1, .. }
        }
    ));
}

#[tokio::test]
async fn test_thesis_deactivated_mid_job_fails_later_items() {
    let mut config = test_config();
    config.batch_concurrency = 1;
    let oracle = Arc::new(MockOracle::default().with_delay(Duration::from_millis(200)));
    let app = setup_with_config(config, oracle, vec![]);
    let ids: Vec<String> = (0..3).map(|i| add_deal(&app, &format!("Deal {i}")).id).collect();
    let thesis = app
        .create_thesis(
            "inv-1",
            "Fintech".into(),
            "Seed fintech infrastructure.".into(),
            ThesisCriteria {
                sectors: vec!["fintech".into()],
                ..Default::default()
            },
        )
        .unwrap();

    let job_id = app
        .submit_batch_job(JobSpec {
            kind: JobKind::Match,
            investor_id: "inv-1".into(),
            thesis_id: Some(thesis.id.clone()),
            target_ids: ids,
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.deactivate_thesis(&thesis.id, "inv-1").unwrap();

    let job = app.wait_for_job(&job_id, POLL).await.unwrap();
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(job.succeeded_count(), 1);
    assert_eq!(job.failed_count(), 2);
    match &job.items[2].status {
        ItemStatus::Failed { reason } => assert!(reason.contains("inactive")),
        other => panic!("expected failure, got {other:?}"),
    }
}
