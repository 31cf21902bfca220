//! # campus-demo
//!
//! Runs the social layer against the embedded store: seeds a small campus,
//! then prints what one viewer sees (feed, friends, notifications, search)
//! as JSON.
//!
//! ```text
//! campus-demo [viewer-uid] [search-text]
//! ```
//!
//! Settings come from `CAMPUS_*` environment variables; logging honours
//! `RUST_LOG`.

use std::sync::Arc;

use anyhow::Context;
use campus_social::model::event::EventDraft;
use campus_social::auth::{require_signed_in, require_verified};
use campus_social::telemetry;
use campus_social::{
    AuthUser, CampusSocial, FeedOptions, ReplyTarget, RsvpStatus, SocialConfig, StaticAuth,
    Visibility,
};
use campus_store::MemoryStore;
use tracing::info;

const USERS: &[(&str, &str)] = &[("ada", "Ada"), ("bo", "Bo"), ("cy", "Cy"), ("di", "Di")];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Tracing and configuration
    // -----------------------------------------------------------------------
    telemetry::init_tracing();
    info!("Starting campus demo v{}", env!("CARGO_PKG_VERSION"));

    let config = SocialConfig::from_env();
    info!(?config, "Loaded configuration");

    let mut args = std::env::args().skip(1);
    let viewer_uid = args.next().unwrap_or_else(|| "bo".to_string());
    let search = args.next().unwrap_or_else(|| "st".to_string());

    // -----------------------------------------------------------------------
    // 2. Seed the embedded store
    // -----------------------------------------------------------------------
    let store = Arc::new(MemoryStore::new());
    let social = CampusSocial::new(store, &config);
    seed(&social).await.context("seeding demo data")?;

    // -----------------------------------------------------------------------
    // 3. Report what the viewer sees
    // -----------------------------------------------------------------------
    let session = StaticAuth(Some(AuthUser::new(
        viewer_uid.as_str(),
        format!("{viewer_uid}@campus.edu"),
        true,
    )));
    let viewer = require_signed_in(&session)?.uid;
    if let Err(err) = social.profiles.touch_last_active(&viewer).await {
        telemetry::report("touch_last_active", &err);
    }

    let profile = social.profiles.get_profile(&viewer).await?;
    let friend_uids = social.friends.friend_uids(&viewer).await?;
    let interests = profile
        .as_ref()
        .map(|p| p.interests.clone())
        .unwrap_or_default();
    let options = FeedOptions {
        current_uid: Some(viewer.clone()),
        friend_uids,
        ..FeedOptions::default()
    };

    let report = serde_json::json!({
        "viewer": profile,
        "feed": social.feed.fetch_feed(&options).await?,
        "interestsFeed": social.feed.fetch_interests_feed(&interests, &options).await?,
        "friends": social.friends.list_friends(&viewer).await?,
        "incomingRequests": social.friends.incoming_requests(&viewer).await?,
        "notifications": social.notifications.fetch_notifications(&viewer, 20).await?,
        "unread": social.notifications.unread_count(&viewer).await?,
        "attending": social.rsvps.fetch_user_attending_event_ids(&viewer).await,
        "eventSearch": social.feed.search_events(&search).await?,
        "userSearch": social.profiles.search_users(&search).await?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn seed(social: &CampusSocial) -> campus_social::Result<()> {
    for (uid, name) in USERS {
        let user = AuthUser::new(*uid, format!("{uid}@campus.edu"), true);
        social.profiles.get_or_create_profile(&user, Some(*name)).await?;
    }
    social
        .profiles
        .update_profile(
            "bo",
            "bo",
            &campus_social::model::profile::ProfileUpdate {
                interests: Some(vec!["study".to_string()]),
                ..Default::default()
            },
        )
        .await?;

    social.friends.send_request("bo", "Bo", "ada").await?;
    social.friends.accept_request("ada", "bo", "ada").await?;
    social.friends.send_request("cy", "Cy", "bo").await?;

    let ada = require_verified(&StaticAuth(Some(AuthUser::new("ada", "ada@campus.edu", true))))?;
    let mut study = EventDraft::new("Study group", "Linear algebra, chapter 4");
    study.category_id = "study".to_string();
    study.visibility = Visibility::Friends;
    let study = social.events.create_event(&ada, "Ada", &study).await?;

    let di = require_verified(&StaticAuth(Some(AuthUser::new("di", "di@campus.edu", true))))?;
    let mut party = EventDraft::new("Start of term party", "Quad, 8pm");
    party.category_id = "social".to_string();
    party.capacity = Some(120);
    social.events.create_event(&di, "Di", &party).await?;

    let question = social
        .comments
        .add_comment(&study.id, "Which room?", "bo", "Bo", None)
        .await?;
    social
        .comments
        .add_comment(
            &study.id,
            "Library 3F",
            "ada",
            "Ada",
            Some(&ReplyTarget {
                comment_id: question.id.clone(),
                root_id: question.root_id.clone(),
                uid: question.created_by.clone(),
            }),
        )
        .await?;
    social.rsvps.rsvp(&study.id, "bo", RsvpStatus::Going).await?;

    info!(users = USERS.len(), "demo data seeded");
    Ok(())
}
