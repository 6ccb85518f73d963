use super::common::*;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::workflows::recruiting::context::RunContext;
use crate::workflows::recruiting::domain::{CandidateStatus, SourceChannel};
use crate::workflows::recruiting::sourcing::{
    CandidateRepository, InMemoryCandidateRepository, SourceRegistry, SourcingOutput,
    SourcingWorker,
};
use crate::workflows::recruiting::stage::{StageKind, StageOrchestrator};

fn raw(channel: SourceChannel, values: &[Value]) -> Arc<InMemoryCandidateRepository> {
    Arc::new(InMemoryCandidateRepository::from_raw(channel, values))
}

fn source(ctx: &mut RunContext) -> SourcingOutput {
    StageOrchestrator::new(SourcingWorker::new(job(), 50))
        .run(ctx)
        .output
}

fn names(output: &SourcingOutput) -> Vec<(&str, &str)> {
    output
        .candidates
        .iter()
        .map(|record| (record.id.as_str(), record.name.as_str()))
        .collect()
}

#[test]
fn channels_sharing_an_id_keep_both_people() {
    let linkedin = raw(
        SourceChannel::Linkedin,
        &[json!({ "id": "42", "name": "Ana Ruiz", "contact_info": { "email": "ana@x.com" } })],
    );
    let database = raw(
        SourceChannel::Database,
        &[json!({ "id": 42, "name": "Bob Lee", "email": "bob@y.com" })],
    );
    let sources = SourceRegistry::default()
        .with(SourceChannel::Linkedin, linkedin as Arc<dyn CandidateRepository>)
        .with(
            SourceChannel::Database,
            Arc::clone(&database) as Arc<dyn CandidateRepository>,
        );
    let mut ctx = context().with_sources(sources);

    let output = source(&mut ctx);

    assert_eq!(names(&output), vec![("42", "Ana Ruiz"), ("database:42", "Bob Lee")]);
    assert_eq!(output.channels[&SourceChannel::Database].admitted, 1);
    assert_eq!(output.channels[&SourceChannel::Database].duplicates, 0);
    assert_eq!(ctx.error_count(), 0);

    let bob = &output.candidates[1];
    assert_eq!(bob.source_id().as_str(), "42");
    assert!(ctx.advance_candidate(
        StageKind::Screening,
        &bob.id,
        CandidateStatus::Screened,
        None
    ));
    let updates = database.status_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id.as_str(), "42");
    assert_eq!(ctx.error_count(), 0);
}

#[test]
fn id_still_taken_after_qualifying_is_an_item_error() {
    let database = raw(
        SourceChannel::Database,
        &[
            json!({ "id": "7", "name": "Ana Ruiz", "email": "ana@x.com" }),
            json!({ "id": "7", "name": "Bob Lee", "email": "bob@y.com" }),
            json!({ "id": "7", "name": "Cy Young", "email": "cy@z.com" }),
        ],
    );
    let sources = SourceRegistry::default().with(SourceChannel::Database, database);
    let mut ctx = context().with_sources(sources);

    let output = source(&mut ctx);

    assert_eq!(names(&output), vec![("7", "Ana Ruiz"), ("database:7", "Bob Lee")]);
    let metrics = &output.channels[&SourceChannel::Database];
    assert_eq!(metrics.admitted, 2);
    assert_eq!(metrics.duplicates, 0);
    assert_eq!(metrics.rejected, 1);
    assert_eq!(ctx.errors()[0].item.as_deref(), Some("database:7"));
    assert!(ctx.errors()[0].message.contains("already taken"));
}

#[test]
fn email_duplicates_collapse_across_channels() {
    let database = raw(
        SourceChannel::Database,
        &[json!({ "id": "db-1", "name": "Ada Lovelace", "email": "ada@example.com" })],
    );
    let indeed = raw(
        SourceChannel::Indeed,
        &[json!({ "id": "in-9", "name": "A. Lovelace", "contact_email": " ADA@Example.com " })],
    );
    let sources = SourceRegistry::default()
        .with(SourceChannel::Database, database)
        .with(SourceChannel::Indeed, indeed);
    let mut ctx = context().with_sources(sources);

    let output = source(&mut ctx);

    assert_eq!(names(&output), vec![("db-1", "Ada Lovelace")]);
    assert_eq!(output.channels[&SourceChannel::Indeed].duplicates, 1);
}

#[test]
fn name_only_duplicates_collapse_across_channels() {
    let referral = raw(
        SourceChannel::Referral,
        &[json!({ "id": "ref-1", "name": "Ana Ruiz" })],
    );
    let database = raw(
        SourceChannel::Database,
        &[json!({ "id": "db-5", "name": "ana  ruiz" })],
    );
    let sources = SourceRegistry::default()
        .with(SourceChannel::Referral, referral)
        .with(SourceChannel::Database, database);
    let mut ctx = context().with_sources(sources);

    let output = source(&mut ctx);

    assert_eq!(names(&output), vec![("ref-1", "Ana Ruiz")]);
    assert_eq!(output.channels[&SourceChannel::Database].duplicates, 1);
}

#[test]
fn profiles_without_name_or_email_are_all_kept() {
    let database = raw(
        SourceChannel::Database,
        &[
            json!({ "id": 1, "skills": ["SQL"] }),
            json!({ "id": 2, "skills": ["SQL"] }),
        ],
    );
    let sources = SourceRegistry::default().with(SourceChannel::Database, database);
    let mut ctx = context().with_sources(sources);

    let output = source(&mut ctx);

    let metrics = &output.channels[&SourceChannel::Database];
    assert_eq!(metrics.returned, 2);
    assert_eq!(metrics.admitted, 2);
    assert_eq!(metrics.duplicates, 0);
    assert_eq!(output.candidates.len(), 2);
}
