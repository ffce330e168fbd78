//! Study path planner agent - personalized learning paths over the syllabus.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Enhancement, Envelope,
    ProgressUpdate, QueryContext, Result, StudyPathRequest, StudyPlanner, TopicStatus,
};

use crate::contains_any;

pub const ID: &str = "study_path_planner";

const PLANNING_KEYWORDS: &[&str] = &[
    "study plan",
    "learning path",
    "syllabus",
    "schedule",
    "prepare for",
    "roadmap",
    "study schedule",
    "planning",
    "what to study",
    "study order",
    "curriculum",
];

const PLANNED_SUBJECTS: &[&str] = &["Science", "Mathematics", "Social Science"];

const DEFAULT_USER: &str = "default_user";
const DEFAULT_GRADE: &str = "10";
const DEFAULT_HOURS_PER_WEEK: f64 = 10.0;
const DEFAULT_TARGET_WEEKS: u64 = 12;
const COMPLETED_MASTERY: u8 = 3;

pub struct StudyPathPlannerAgent {
    profile: AgentProfile,
    planner: Option<Arc<dyn StudyPlanner>>,
}

impl StudyPathPlannerAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Study Path Planner Agent")
                .with_description(
                    "Creates personalized study plans and learning paths based on syllabus",
                )
                .with_capabilities(vec![
                    AgentCapability::LearningPath,
                    AgentCapability::ContentGeneration,
                ])
                .with_priority(AgentPriority::Medium)
                .with_default_mode(AgentMode::Auto),
            planner: None,
        }
    }

    pub fn with_planner(mut self, planner: Arc<dyn StudyPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }
}

impl Default for StudyPathPlannerAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn user(ctx: &QueryContext) -> &str {
    ctx.user_id.as_deref().unwrap_or(DEFAULT_USER)
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn missing_path_id() -> Envelope {
    Envelope::failure("Which study path? Pass a path_id.").with_error("path_id required")
}

async fn create_path(planner: &dyn StudyPlanner, ctx: &QueryContext) -> Result<Envelope> {
    let user_id = user(ctx);
    let Some(subject) = ctx.subject.as_deref() else {
        return Ok(Envelope::failure("Pick a subject to plan for")
            .with_error("Subject required for creating study path")
            .with("available_subjects", PLANNED_SUBJECTS.to_vec()));
    };
    let grade = ctx.grade_level.as_deref().unwrap_or(DEFAULT_GRADE);

    let topics = planner.get_syllabus_topics(Some(subject), Some(grade)).await?;
    if topics.is_empty() {
        return Ok(
            Envelope::failure(format!("No syllabus found for {subject} Grade {grade}"))
                .with_error(format!("No syllabus found for {subject} Grade {grade}"))
                .with_suggestion(
                    "Try different subject or connect to internet for more content",
                ),
        );
    }

    let existing = planner.get_user_paths(user_id, Some(subject)).await?;
    if !existing.is_empty() {
        return Ok(
            Envelope::message("You already have study paths for this subject")
                .with("has_existing_path", true)
                .with("paths", serde_json::to_value(&existing)?)
                .with("action", "continue_existing_or_create_new"),
        );
    }

    let weeks = clamp_u32(ctx.get_u64("target_weeks").unwrap_or(DEFAULT_TARGET_WEEKS));
    let request = StudyPathRequest {
        user_id: user_id.to_string(),
        subject: subject.to_string(),
        grade_level: grade.to_string(),
        available_hours_per_week: ctx.get_f64("available_hours").unwrap_or(DEFAULT_HOURS_PER_WEEK)
            as f32,
        target_weeks: weeks,
    };
    let generated = match planner.generate_optimal_study_path(&request).await {
        Ok(generated) => generated,
        Err(e) => {
            return Ok(Envelope::failure("Could not create a study path").with_error(e.to_string()))
        }
    };

    let items = planner
        .get_study_path_details(generated.path_id)
        .await?
        .map(|details| details.items)
        .unwrap_or_default();
    let first = items.first().cloned();

    Ok(
        Envelope::message(format!("Study path created for {subject}"))
            .with(
                "study_path",
                json!({
                    "path_id": generated.path_id,
                    "subject": subject,
                    "grade_level": grade,
                    "total_topics": generated.total_topics,
                    "duration_weeks": weeks,
                    "estimated_hours": generated.estimated_hours,
                    "topics": serde_json::to_value(&items)?,
                }),
            )
            .with(
                "next_steps",
                json!({
                    "action": "start_learning",
                    "next_topic": serde_json::to_value(&first)?,
                    "recommendation": "Begin with the first topic in your study path",
                }),
            ),
    )
}

async fn next_topic(planner: &dyn StudyPlanner, ctx: &QueryContext) -> Result<Envelope> {
    let Some(path_id) = ctx.get_u64("path_id") else {
        return Ok(missing_path_id());
    };
    let Some(item) = planner.get_next_topic(path_id).await? else {
        return Ok(
            Envelope::message("Congratulations! You have completed this study path!")
                .with_suggestion("Review topics or start a new subject")
                .with("completed", true),
        );
    };

    Ok(Envelope::message(format!("Next up: {}", item.topic))
        .with(
            "next_topic",
            json!({
                "topic": item.topic,
                "subtopics": item.subtopics,
                "difficulty": serde_json::to_value(item.difficulty)?,
                "estimated_hours": item.estimated_hours,
                "description": item.description.as_deref().unwrap_or_default(),
            }),
        )
        .with(
            "progress",
            json!({
                "sequence_order": item.sequence_order,
                "status": serde_json::to_value(item.status)?,
            }),
        ))
}

async fn update_progress(planner: &dyn StudyPlanner, ctx: &QueryContext) -> Result<Envelope> {
    let Some(path_id) = ctx.get_u64("path_id") else {
        return Ok(missing_path_id());
    };
    let Some(topic) = ctx.get_str("topic") else {
        return Ok(Envelope::failure("Which topic? Pass a topic name.").with_error("topic required"));
    };
    let Some(path) = planner.get_study_path_details(path_id).await? else {
        return Ok(Envelope::failure(format!("Study path {path_id} not found"))
            .with_error("Study path not found"));
    };

    let status = TopicStatus::parse_lenient(ctx.get_str("status").unwrap_or("in_progress"));
    planner
        .update_topic_progress(ProgressUpdate {
            user_id: user(ctx).to_string(),
            subject: path.subject.clone(),
            topic: topic.to_string(),
            status,
            time_spent_minutes: clamp_u32(ctx.get_u64("time_spent").unwrap_or(0)),
            mastery_level: (status == TopicStatus::Completed).then_some(COMPLETED_MASTERY),
        })
        .await?;

    let updated = planner.get_study_path_details(path_id).await?.unwrap_or(path);
    Ok(Envelope::message(format!("Progress updated for: {topic}"))
        .with("progress_percentage", updated.progress_percentage)
        .with("completed_topics", updated.completed_topics)
        .with("total_topics", updated.total_topics))
}

async fn review_topics(planner: &dyn StudyPlanner, ctx: &QueryContext) -> Result<Envelope> {
    let due = planner
        .get_topics_due_for_review(user(ctx), ctx.subject.as_deref())
        .await?;
    let recommendation = if due.is_empty() {
        "No topics due for review"
    } else {
        "Review these topics to strengthen your understanding"
    };
    let topics: Vec<_> = due
        .iter()
        .map(|t| {
            json!({
                "topic": t.topic,
                "subject": t.subject,
                "last_studied": t.last_studied.to_rfc3339(),
                "mastery_level": t.mastery_level,
            })
        })
        .collect();

    Ok(Envelope::message(recommendation)
        .with("review_count", due.len())
        .with("topics", topics))
}

#[async_trait]
impl Agent for StudyPathPlannerAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, _ctx: &QueryContext) -> f32 {
        if contains_any(&query.to_lowercase(), PLANNING_KEYWORDS) {
            0.95
        } else {
            0.2
        }
    }

    fn enhancement(&self) -> Enhancement {
        Enhancement::Flag {
            key: "study_path_available",
        }
    }

    async fn process_offline(&self, _query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let Some(planner) = self.planner.as_deref() else {
            return Ok(Envelope::failure("Study planning is not available right now")
                .with_error("Syllabus parser not available"));
        };

        match ctx.operation_or("create_path") {
            "next_topic" => next_topic(planner, ctx).await,
            "update_progress" => update_progress(planner, ctx).await,
            "review_topics" => review_topics(planner, ctx).await,
            _ => create_path(planner, ctx).await,
        }
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        // Planning is local either way.
        self.process_offline(query, ctx).await
    }
}
