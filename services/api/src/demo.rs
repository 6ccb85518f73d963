use crate::infra::{morning_of, read_json, LoggingDispatch};
use chrono::{NaiveDate, Utc};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use talent_ai::clock::{Clock, FixedClock, SystemClock};
use talent_ai::config::AppConfig;
use talent_ai::error::AppError;
use talent_ai::workflows::recruiting::{
    CandidateRepository, CsvCandidateRepository, InMemoryCandidateRepository, InMemoryOutbox,
    InMemoryReplySource, InboundReply, JobRequirements, KeywordClassifier, PipelineCoordinator,
    PipelineError, PipelineReport, PipelineSettings, ScreeningCriteria, ScreeningEngine,
    ScreeningSummary, SourceChannel, SourceRegistry,
};

#[derive(Args, Debug)]
pub(crate) struct ScreenArgs {
    /// Job requirements as a JSON file
    #[arg(long)]
    pub(crate) job: PathBuf,
    /// Candidate export (CSV with Id, Name, Email, Skills, Experience Years, ... columns)
    #[arg(long)]
    pub(crate) candidates: PathBuf,
    /// Screening weights and thresholds as a JSON file
    #[arg(long)]
    pub(crate) criteria: Option<PathBuf>,
    /// Print results as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PipelineRunArgs {
    /// Job requirements as a JSON file
    #[arg(long)]
    pub(crate) job: PathBuf,
    /// Candidate export (CSV) used as the database channel
    #[arg(long)]
    pub(crate) candidates: PathBuf,
    /// Candidate replies as a JSON array
    #[arg(long)]
    pub(crate) replies: Option<PathBuf>,
    /// Screening weights and thresholds as a JSON file
    #[arg(long)]
    pub(crate) criteria: Option<PathBuf>,
    /// Pin the run date (YYYY-MM-DD) so interview slots are reproducible
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pin the demo date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_screening(args: ScreenArgs) -> Result<(), AppError> {
    let job: JobRequirements = read_json(&args.job)?;
    job.validate().map_err(PipelineError::from)?;
    let criteria = load_criteria(args.criteria.as_deref())?;
    let engine = ScreeningEngine::new(criteria).map_err(PipelineError::from)?;

    let repository = CsvCandidateRepository::from_path(&args.candidates)?;
    let rows = match repository.query(&job, usize::MAX) {
        Ok(rows) => rows,
        Err(err) => {
            println!("Candidate export unavailable: {}", err);
            return Ok(());
        }
    };

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for row in rows {
        match row {
            Ok(candidate) => results.push(engine.screen(&candidate, &job)),
            Err(err) => skipped.push(err.to_string()),
        }
    }
    results.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let summary = ScreeningSummary::from_results(&results, skipped.len());
    println!("Screening for {} ({})", job.title, job.job_id);
    println!(
        "- {} screened | {} passed | {} shortlisted | average {:.1}",
        summary.total_candidates, summary.passed, summary.shortlisted, summary.average_score
    );
    for result in &results {
        println!(
            "  - {} ({}): {:.1} -> {}",
            result.candidate_name,
            result.candidate_id,
            result.weighted_score,
            result.decision_summary()
        );
    }
    if !skipped.is_empty() {
        println!("Skipped rows:");
        for reason in &skipped {
            println!("  - {}", reason);
        }
    }
    for recommendation in summary.recommendations() {
        println!("* {}", recommendation);
    }

    Ok(())
}

pub(crate) fn run_pipeline(args: PipelineRunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let job: JobRequirements = read_json(&args.job)?;
    let criteria = load_criteria(args.criteria.as_deref())?;
    let replies: Vec<InboundReply> = match &args.replies {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let repository = CsvCandidateRepository::from_path(&args.candidates)?;
    let sources = SourceRegistry::default().with(SourceChannel::Database, Arc::new(repository));
    let clock: Arc<dyn Clock> = match args.today {
        Some(today) => Arc::new(FixedClock(morning_of(today))),
        None => Arc::new(SystemClock),
    };

    let report = PipelineCoordinator::new(
        sources,
        Arc::new(LoggingDispatch),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::new(replies)),
    )
    .with_clock(clock)
    .with_settings(PipelineSettings::from_config(&config.recruiting))
    .run(&job, criteria)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_pipeline_report(&report);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let report = demo_report(today)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Recruiting pipeline demo ({})", today);
    render_pipeline_report(&report);
    Ok(())
}

fn load_criteria(path: Option<&std::path::Path>) -> Result<ScreeningCriteria, AppError> {
    match path {
        Some(path) => read_json(path),
        None => Ok(ScreeningCriteria::default()),
    }
}

pub(crate) fn demo_report(today: NaiveDate) -> Result<PipelineReport, AppError> {
    let job = demo_job();
    let sources = SourceRegistry::default()
        .with(
            SourceChannel::Database,
            Arc::new(InMemoryCandidateRepository::from_raw(
                SourceChannel::Database,
                &[
                    json!({
                        "id": "db-1",
                        "name": "Maya Chen",
                        "email": "maya.chen@example.com",
                        "location": "Remote",
                        "current_title": "ML Engineer",
                        "skills": ["Python", "PyTorch", "ML", "AWS", "Docker"],
                        "experience_years": 9
                    }),
                    json!({
                        "id": "db-2",
                        "name": "Jordan Patel",
                        "email": "jordan.patel@example.com",
                        "location": "Austin, TX",
                        "skills": "Python, TensorFlow, Machine Learning, Kubernetes",
                        "experience_years": "6"
                    }),
                    json!({
                        "id": "db-3",
                        "name": "Riley Park",
                        "email": "riley.park@example.com",
                        "experience_years": "ten"
                    }),
                ],
            )),
        )
        .with(
            SourceChannel::Referral,
            Arc::new(InMemoryCandidateRepository::from_raw(
                SourceChannel::Referral,
                &[json!({
                    "id": "ref-1",
                    "name": "Sam Rivera",
                    "email": "sam.rivera@example.com",
                    "location": "Oakland, CA",
                    "skills": ["Python", "PyTorch", "Machine Learning", "Docker"],
                    "experience_years": 7
                })],
            )),
        )
        .with(
            SourceChannel::Linkedin,
            Arc::new(InMemoryCandidateRepository::from_raw(
                SourceChannel::Linkedin,
                &[json!({
                    "source_id": "li-201",
                    "name": "Alex Kim",
                    "headline": "Data Scientist",
                    "location": "San Francisco, CA",
                    "skills": ["Python", "Machine Learning"],
                    "contact_info": { "email": "alex.kim@example.com" }
                })],
            )),
        )
        .with(
            SourceChannel::Indeed,
            Arc::new(InMemoryCandidateRepository::from_raw(
                SourceChannel::Indeed,
                &[json!({
                    "id": "in-77",
                    "name": "Maya Chen",
                    "title": "Machine Learning Engineer",
                    "contact_email": "Maya.Chen@example.com"
                })],
            )),
        );

    let replies = vec![
        InboundReply {
            from_email: "maya.chen@example.com".to_string(),
            from_name: Some("Maya Chen".to_string()),
            subject: format!("Re: {} opportunity", job.title),
            content: "This sounds great! A video call any afternoon next week works for me."
                .to_string(),
            received_at: None,
        },
        InboundReply {
            from_email: "sam.rivera@example.com".to_string(),
            from_name: Some("Sam Rivera".to_string()),
            subject: format!("Re: {} opportunity", job.title),
            content: "Thanks for reaching out. What does the team structure look like, and is the role fully remote?"
                .to_string(),
            received_at: None,
        },
    ];

    let report = PipelineCoordinator::new(
        sources,
        Arc::new(InMemoryOutbox::new()),
        Arc::new(KeywordClassifier),
        Arc::new(InMemoryReplySource::new(replies)),
    )
    .with_clock(Arc::new(FixedClock(morning_of(today))))
    .run(&job, ScreeningCriteria::default())?;
    Ok(report)
}

fn demo_job() -> JobRequirements {
    JobRequirements {
        job_id: "job-ml-007".to_string(),
        title: "Senior Machine Learning Engineer".to_string(),
        company: "Acme Robotics".to_string(),
        description: "Train and ship perception models for warehouse robots.".to_string(),
        required_skills: vec![
            "Python".to_string(),
            "Machine Learning".to_string(),
            "PyTorch".to_string(),
        ],
        preferred_skills: vec!["AWS".to_string(), "Docker".to_string()],
        min_experience_years: 5.0,
        preferred_experience_years: 8.0,
        location: Some("San Francisco".to_string()),
        remote_allowed: true,
        education_requirements: Vec::new(),
    }
}

pub(crate) fn render_pipeline_report(report: &PipelineReport) {
    println!("Run {} for job {}", report.run_id, report.job_id);
    println!("Stages:");
    for stage in &report.stages {
        println!(
            "  - {}: {} in / {} out | {} error(s) | {} pass(es) | {} ms",
            stage.stage,
            stage.items_in,
            stage.items_out,
            stage.errors,
            stage.iterations,
            stage.elapsed_ms
        );
    }

    println!("\nSourcing");
    for metrics in report.channels.values() {
        println!(
            "- {}: {} returned | {} admitted | {} duplicates | {} rejected",
            metrics.channel, metrics.returned, metrics.admitted, metrics.duplicates, metrics.rejected
        );
    }

    let summary = &report.screening_summary;
    println!("\nScreening");
    println!(
        "- {} screened | {} passed | {} shortlisted | average {:.1}",
        summary.total_candidates, summary.passed, summary.shortlisted, summary.average_score
    );
    for result in &report.screening_results {
        println!(
            "  - {}: {:.1} -> {}",
            result.candidate_name,
            result.weighted_score,
            result.decision_summary()
        );
    }
    for recommendation in &report.recommendations {
        println!("  * {}", recommendation);
    }

    let outreach = &report.outreach_metrics;
    println!("\nOutreach");
    println!(
        "- {} of {} messages delivered ({:.0}%)",
        outreach.sent, outreach.total, outreach.delivery_rate
    );

    let metrics = &report.response_metrics;
    println!("\nResponses");
    println!(
        "- {} replies | {} interested | {} questions | {:.0}% automated",
        metrics.total_responses, metrics.interested, metrics.questions, metrics.automation_rate
    );
    for response in &report.responses {
        println!(
            "  - {}: {} ({:.0}% confidence) -> {}{}",
            response.candidate_name,
            response.response_type,
            response.confidence * 100.0,
            response.follow_up_action,
            if response.human_review_needed {
                " [review]"
            } else {
                ""
            }
        );
    }

    if !report.scheduled_interviews.is_empty() {
        println!("Interviews:");
        for interview in &report.scheduled_interviews {
            println!(
                "  - {}: {} on {} with {} ({})",
                interview.candidate_name,
                interview.interview_type,
                interview.scheduled_time.format("%Y-%m-%d %H:%M UTC"),
                interview.interviewer,
                interview.slot_id
            );
        }
    }
    if !report.pending_actions.is_empty() {
        println!("Pending actions:");
        for action in &report.pending_actions {
            println!("  - {}: {:?} ({})", action.response_id, action.kind, action.reason);
        }
    }
    if !report.review_queue.is_empty() {
        println!("Human review queue:");
        for entry in &report.review_queue {
            println!(
                "  - {} priority {}: {}",
                entry.candidate_email,
                entry.priority_level,
                entry.reasons.join("; ")
            );
        }
    }

    if report.errors.is_empty() {
        println!("\nNo item errors");
    } else {
        println!("\nItem errors ({}):", report.total_errors);
        for error in &report.errors {
            println!(
                "  - [{}] {}: {}",
                error.stage,
                error.item.as_deref().unwrap_or("-"),
                error.message
            );
        }
    }
}
