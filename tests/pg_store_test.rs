//! Runs against a real Postgres when `DATABASE_URL` is set; otherwise each
//! test returns early.

use std::env;

use chrono::{DateTime, TimeZone, Utc};
use resumatch_backend::{
    database::{
        pg_store::PgStore,
        pool::create_pool,
        store::{AccountChange, AccountRepository, ReportRepository, SubscriptionRepository, UserRepository},
    },
    models::{
        subscription::{BillingPeriod, Plan, PlanState, ProSubscription, FREE_PLAN_CREDITS, UNLIMITED_CREDITS},
        user::UserProfile,
    },
};
use uuid::Uuid;

async fn setup_store() -> Option<(PgStore, sqlx::PgPool)> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };
    let pool = create_pool(&url).await.expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    Some((PgStore::new(pool.clone()), pool))
}

fn profile(email: Option<&str>) -> UserProfile {
    UserProfile {
        id: format!("user_{}", Uuid::new_v4().simple()),
        email: email.map(str::to_string),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        avatar_url: None,
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("timestamp")
}

fn period(start: i64, end: i64) -> BillingPeriod {
    BillingPeriod {
        start: at(start),
        end: at(end),
    }
}

#[tokio::test]
async fn insert_user_seeds_free_subscription() {
    let Some((store, _)) = setup_store().await else { return };
    let user = profile(Some("ada@example.com"));
    store.insert_user(&user).await.expect("insert");

    let sub = store.find_subscription(&user.id).await.unwrap().expect("seeded row");
    assert_eq!(sub.plan, Plan::Free);
    assert_eq!(sub.credits, FREE_PLAN_CREDITS);
    assert!(sub.is_active);
    assert!(sub.stripe_subscription_id.is_none());

    assert!(store.insert_user(&user).await.is_err());

    let renamed = UserProfile {
        email: None,
        first_name: Some("Grace".into()),
        ..user.clone()
    };
    assert!(store.update_user(&renamed).await.unwrap());
    let stored = store.find_user(&user.id).await.unwrap().expect("user");
    assert_eq!(stored.email, "ada@example.com");
    assert_eq!(stored.first_name.as_deref(), Some("Grace"));

    assert!(store.delete_user(&user.id).await.unwrap());
    assert!(store.find_subscription(&user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn pro_upsert_overwrites_the_single_row() {
    let Some((store, pool)) = setup_store().await else { return };
    let user = profile(Some("ada@example.com"));
    store.insert_user(&user).await.unwrap();
    let sub_id = format!("sub_{}", Uuid::new_v4().simple());

    for (customer, start) in [("cus_1", 1_700_000_000), ("cus_2", 1_702_592_000)] {
        store
            .upsert_pro_subscription(&ProSubscription {
                user_id: user.id.clone(),
                stripe_customer_id: Some(customer.into()),
                stripe_subscription_id: sub_id.clone(),
                period: period(start, start + 2_592_000),
            })
            .await
            .expect("upsert");
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
        .bind(&user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let sub = store.find_subscription(&user.id).await.unwrap().unwrap();
    assert_eq!(sub.plan, Plan::Pro);
    assert_eq!(sub.credits, UNLIMITED_CREDITS);
    assert_eq!(sub.stripe_customer_id.as_deref(), Some("cus_2"));
    assert_eq!(sub.start_date, Some(at(1_702_592_000)));

    let info = store.subscription_info(&user.id).await.unwrap().unwrap();
    assert_eq!((info.plan, info.credits), (Plan::Pro, UNLIMITED_CREDITS));
}

#[tokio::test]
async fn plan_state_keeps_period_when_none_given() {
    let Some((store, _)) = setup_store().await else { return };
    let user = profile(Some("ada@example.com"));
    store.insert_user(&user).await.unwrap();
    let sub_id = format!("sub_{}", Uuid::new_v4().simple());
    store
        .upsert_pro_subscription(&ProSubscription {
            user_id: user.id.clone(),
            stripe_customer_id: None,
            stripe_subscription_id: sub_id.clone(),
            period: period(1_700_000_000, 1_702_592_000),
        })
        .await
        .unwrap();

    assert!(store.apply_plan_state(&sub_id, PlanState::lapsed(), None).await.unwrap());
    let sub = store.find_subscription(&user.id).await.unwrap().unwrap();
    assert_eq!(sub.plan, Plan::Free);
    assert_eq!(sub.credits, FREE_PLAN_CREDITS);
    assert!(!sub.is_active);
    assert_eq!(sub.start_date, Some(at(1_700_000_000)));
    assert_eq!(sub.end_date, Some(at(1_702_592_000)));

    let renewed = period(1_702_592_000, 1_705_184_000);
    assert!(store.apply_plan_state(&sub_id, PlanState::pro(), Some(renewed)).await.unwrap());
    let sub = store.find_subscription(&user.id).await.unwrap().unwrap();
    assert_eq!(sub.end_date, Some(at(1_705_184_000)));

    assert!(!store
        .apply_plan_state("sub_missing", PlanState::lapsed(), None)
        .await
        .unwrap());
}

#[tokio::test]
async fn account_toggle_flips_both_rows_once() {
    let Some((store, _)) = setup_store().await else { return };
    let user = profile(Some("ada@example.com"));
    store.insert_user(&user).await.unwrap();

    let both = AccountChange {
        user: true,
        subscription: true,
    };
    assert_eq!(store.deactivate_account(&user.id).await.unwrap(), both);
    assert_eq!(store.deactivate_account(&user.id).await.unwrap(), AccountChange::default());
    assert!(!store.find_user(&user.id).await.unwrap().unwrap().is_active);
    assert!(!store.find_subscription(&user.id).await.unwrap().unwrap().is_active);

    assert_eq!(store.reactivate_account(&user.id).await.unwrap(), both);
    assert!(store.find_user(&user.id).await.unwrap().unwrap().is_active);

    assert_eq!(store.reactivate_account("ghost").await.unwrap(), AccountChange::default());
}

#[tokio::test]
async fn report_reads_follow_links_and_owner() {
    let Some((store, pool)) = setup_store().await else { return };
    let user = profile(Some("ada@example.com"));
    store.insert_user(&user).await.unwrap();

    let report_id: Uuid = sqlx::query_scalar(
        "INSERT INTO job_reports (user_id, filename, role, skills) VALUES ($1, 'cv.pdf', 'Backend Developer', $2) RETURNING id",
    )
    .bind(&user.id)
    .bind(vec!["Rust".to_string()])
    .fetch_one(&pool)
    .await
    .unwrap();
    let post_id: Uuid = sqlx::query_scalar(
        "INSERT INTO job_posts (role, company, location) VALUES ('Backend Developer', 'Acme', 'Rome') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO job_report_posts (job_report_id, job_post_id) VALUES ($1, $2)")
        .bind(report_id)
        .bind(post_id)
        .execute(&pool)
        .await
        .unwrap();
    for score in [61, 87] {
        sqlx::query(
            "INSERT INTO match_scores (user_id, job_post_id, job_report_id, score, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&user.id)
        .bind(post_id)
        .bind(report_id)
        .bind(score)
        .bind(Utc::now() + chrono::Duration::seconds(i64::from(score)))
        .execute(&pool)
        .await
        .unwrap();
    }

    assert_eq!(store.report_owner(report_id).await.unwrap(), Some(user.id.clone()));
    assert_eq!(store.report_owner(Uuid::new_v4()).await.unwrap(), None);
    assert_eq!(store.count_job_posts(report_id).await.unwrap(), 1);
    assert_eq!(store.job_posts_for_report(report_id).await.unwrap()[0].company, "Acme");
    assert_eq!(store.list_reports(&user.id).await.unwrap()[0].filename, "cv.pdf");

    let score = store.match_score(post_id, report_id, &user.id).await.unwrap();
    assert_eq!(score.map(|s| s.score), Some(87));
}
