//! Assessment agent - quizzes and answer checking.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::json;
use tracing::warn;
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Enhancement, Envelope,
    QueryContext, Result,
};
use vidya_llm::{LlmClient, LlmRequest};

use crate::contains_any;

pub const ID: &str = "assessment";

const ASSESSMENT_KEYWORDS: &[&str] = &[
    "quiz",
    "test",
    "question",
    "practice",
    "mcq",
    "exam",
    "assessment",
    "evaluate",
    "check answer",
];

const DEFAULT_SUBJECT: &str = "Mathematics";
const DEFAULT_DIFFICULTY: &str = "medium";
const DEFAULT_COUNT: u64 = 5;

pub const QUIZ_SUBJECTS: &[&str] = &["Mathematics", "Science"];

/// Offline question bank, three questions per subject and difficulty.
fn question_bank(subject: &str, difficulty: &str) -> Option<&'static [&'static str]> {
    let questions: &'static [&'static str] = match (subject, difficulty) {
        ("Mathematics", "easy") => &[
            "What is 5 + 7?",
            "Calculate the area of a square with side 4 cm",
            "What is 3 × 8?",
        ],
        ("Mathematics", "medium") => &[
            "Solve: 2x + 5 = 15",
            "Find the perimeter of a rectangle with length 8 cm and width 5 cm",
            "Calculate: (15 + 25) ÷ 4",
        ],
        ("Mathematics", "hard") => &[
            "Solve the quadratic equation: x² - 5x + 6 = 0",
            "Find the value of sin(30°)",
            "Calculate the volume of a cylinder with radius 7 cm and height 10 cm",
        ],
        ("Science", "easy") => &[
            "What is the chemical symbol for water?",
            "Name the process by which plants make food",
            "What is the unit of force?",
        ],
        ("Science", "medium") => &[
            "Explain Newton's first law of motion",
            "What is photosynthesis? Write the equation",
            "Describe the structure of an atom",
        ],
        ("Science", "hard") => &[
            "Explain the difference between concave and convex lenses",
            "Describe the working of a human heart",
            "Explain how electricity is generated in a thermal power plant",
        ],
        _ => return None,
    };
    Some(questions)
}

pub struct AssessmentAgent {
    profile: AgentProfile,
    llm: Option<Arc<dyn LlmClient>>,
}

impl AssessmentAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Assessment Agent")
                .with_description("Generates quizzes, tests, and provides learning assessments")
                .with_capabilities(vec![
                    AgentCapability::Assessment,
                    AgentCapability::ContentGeneration,
                ])
                .with_priority(AgentPriority::Medium)
                .with_default_mode(AgentMode::Auto),
            llm: None,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    async fn ai_quiz(
        &self,
        llm: &dyn LlmClient,
        query: &str,
        ctx: &QueryContext,
    ) -> Result<Envelope> {
        let subject = ctx.subject.as_deref().unwrap_or("General");
        let topic = ctx.get_str("topic").unwrap_or(query);
        let difficulty = ctx.get_str("difficulty").unwrap_or(DEFAULT_DIFFICULTY);
        let count = ctx.get_u64("count").unwrap_or(DEFAULT_COUNT);
        let question_type = ctx.get_str("question_type").unwrap_or("mcq");

        let prompt = format!(
            "Generate {count} {question_type} questions on the topic: {topic}\n\
             Subject: {subject}\n\
             Difficulty: {difficulty}\n\n\
             For MCQ give the question, four options (A-D) and the correct answer.\n\
             For short answer give the question only.\n\
             Keep them educational and suitable for students."
        );
        let response = llm.complete(LlmRequest::prompt(None, prompt)).await?;

        Ok(Envelope::message("AI-generated questions for practice")
            .with("subject", subject)
            .with("topic", topic)
            .with("difficulty", difficulty)
            .with("question_count", count)
            .with("questions_text", response.content)
            .with("source", "ai_generated"))
    }

    async fn ai_evaluation(&self, llm: &dyn LlmClient, ctx: &QueryContext) -> Result<Envelope> {
        let question = ctx.get_str("question").unwrap_or_default();
        let answer = ctx.get_str("answer").unwrap_or_default();
        let prompt = format!(
            "Evaluate this student answer.\n\n\
             Question: {question}\n\
             Student Answer: {answer}\n\n\
             Say whether it is correct (Yes/No), give brief feedback, and if it is wrong \
             give a hint without revealing the full answer. Keep it short and friendly."
        );
        let response = llm.complete(LlmRequest::prompt(None, prompt)).await?;

        Ok(Envelope::message(response.content.clone())
            .with("evaluation", response.content)
            .with("source", "ai_evaluation"))
    }
}

impl Default for AssessmentAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn offline_quiz(ctx: &QueryContext) -> Envelope {
    let subject = ctx.subject.as_deref().unwrap_or(DEFAULT_SUBJECT);
    if !QUIZ_SUBJECTS.contains(&subject) {
        return Envelope::failure(format!("Subject {subject} not available offline"))
            .with_error(format!("Subject {subject} not available offline"))
            .with("available_subjects", QUIZ_SUBJECTS.to_vec());
    }

    let requested = ctx.get_str("difficulty").unwrap_or(DEFAULT_DIFFICULTY);
    let (difficulty, bank) = match question_bank(subject, requested) {
        Some(bank) => (requested, bank),
        None => (
            DEFAULT_DIFFICULTY,
            question_bank(subject, DEFAULT_DIFFICULTY).unwrap_or_default(),
        ),
    };

    let count = (ctx.get_u64("count").unwrap_or(DEFAULT_COUNT) as usize).min(bank.len());
    let selected: Vec<&str> = bank
        .choose_multiple(&mut rand::thread_rng(), count)
        .copied()
        .collect();
    let questions: Vec<_> = selected
        .iter()
        .enumerate()
        .map(|(i, q)| json!({ "id": i + 1, "question": q, "type": "short_answer" }))
        .collect();

    Envelope::message(
        "Questions from pre-loaded bank. Connect to internet for custom AI-generated quizzes.",
    )
    .with("subject", subject)
    .with("difficulty", difficulty)
    .with("question_count", questions.len())
    .with("questions", questions)
}

fn exact_match_evaluation(ctx: &QueryContext) -> Envelope {
    let Some(correct) = ctx.get_str("correct_answer").filter(|s| !s.trim().is_empty()) else {
        return Envelope::failure("Cannot check this answer offline")
            .with_error("Correct answer required for offline evaluation");
    };
    let answer = ctx.get_str("answer").unwrap_or_default();
    let is_correct = answer.trim().to_lowercase() == correct.trim().to_lowercase();

    let envelope = Envelope::message(if is_correct {
        "Correct!"
    } else {
        "Incorrect. Please try again."
    })
    .with("is_correct", is_correct)
    .with("your_answer", answer)
    .with("evaluation_method", "exact_match");

    if is_correct {
        envelope
    } else {
        envelope.with("correct_answer", correct)
    }
}

fn unsupported(operation: &str) -> Envelope {
    Envelope::failure(format!("Operation {operation} not supported offline"))
        .with_error(format!("Operation {operation} not supported offline"))
}

#[async_trait]
impl Agent for AssessmentAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, _ctx: &QueryContext) -> f32 {
        if contains_any(&query.to_lowercase(), ASSESSMENT_KEYWORDS) {
            0.9
        } else {
            0.2
        }
    }

    fn enhancement(&self) -> Enhancement {
        Enhancement::Flag {
            key: "practice_available",
        }
    }

    async fn process_offline(&self, _query: &str, ctx: &QueryContext) -> Result<Envelope> {
        Ok(match ctx.operation_or("generate_quiz") {
            "generate_quiz" => offline_quiz(ctx),
            "evaluate_answer" => exact_match_evaluation(ctx),
            other => unsupported(other),
        })
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let operation = ctx.operation_or("generate_quiz");
        let Some(llm) = self.llm.as_deref() else {
            return self.process_offline(query, ctx).await;
        };

        let attempt = match operation {
            "generate_quiz" => self.ai_quiz(llm, query, ctx).await,
            "evaluate_answer" => self.ai_evaluation(llm, ctx).await,
            _ => return self.process_offline(query, ctx).await,
        };

        match attempt {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                warn!(agent = ID, operation, error = %e, "Remote AI failed, using offline assessment");
                self.process_offline(query, ctx).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn scores() {
        let agent = AssessmentAgent::new();
        let ctx = QueryContext::default();
        assert_eq!(agent.can_handle("Give me a quiz", &ctx), 0.9);
        assert_eq!(agent.can_handle("hello", &ctx), 0.2);
        assert_eq!(
            agent.enhancement(),
            Enhancement::Flag {
                key: "practice_available"
            }
        );
    }

    #[tokio::test]
    async fn quiz_from_bank() {
        let agent = AssessmentAgent::new();
        let ctx = QueryContext::new()
            .with_subject("Mathematics")
            .with_extra("difficulty", "medium")
            .with_extra("count", 2);
        let resp = agent.process_offline("quiz", &ctx).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.get("question_count"), Some(&json!(2)));

        let questions = resp.get("questions").unwrap().as_array().unwrap();
        let ids: Vec<u64> = questions.iter().map(|q| q["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2]);

        let bank = question_bank("Mathematics", "medium").unwrap();
        let texts: HashSet<&str> = questions
            .iter()
            .map(|q| q["question"].as_str().unwrap())
            .collect();
        assert_eq!(texts.len(), 2);
        assert!(texts.iter().all(|t| bank.contains(t)));
    }

    #[tokio::test]
    async fn count_is_capped_and_difficulty_defaults() {
        let agent = AssessmentAgent::new();
        let ctx = QueryContext::new()
            .with_subject("Science")
            .with_extra("difficulty", "impossible")
            .with_extra("count", 50);
        let resp = agent.process_offline("quiz", &ctx).await.unwrap();
        assert_eq!(resp.get_str("difficulty"), Some("medium"));
        assert_eq!(resp.get("question_count"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn unknown_subject_lists_alternatives() {
        let agent = AssessmentAgent::new();
        let ctx = QueryContext::new().with_subject("Music");
        let resp = agent.process_offline("quiz", &ctx).await.unwrap();
        assert!(!resp.success);
        assert_eq!(
            resp.get("available_subjects"),
            Some(&json!(["Mathematics", "Science"]))
        );
    }

    #[tokio::test]
    async fn exact_match_evaluation_ignores_case_and_space() {
        let agent = AssessmentAgent::new();
        let ctx = QueryContext::new()
            .with_operation("evaluate_answer")
            .with_extra("answer", "  H2o ")
            .with_extra("correct_answer", "H2O");
        let resp = agent.process_offline("", &ctx).await.unwrap();
        assert_eq!(resp.get("is_correct"), Some(&json!(true)));
        assert!(resp.get("correct_answer").is_none());

        let ctx = QueryContext::new()
            .with_operation("evaluate_answer")
            .with_extra("answer", "CO2");
        let resp = agent.process_offline("", &ctx).await.unwrap();
        assert!(!resp.success);
    }
}
