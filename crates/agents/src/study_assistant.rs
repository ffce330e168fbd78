//! Study assistant agent - homework help and explanations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Envelope, KnowledgeLookup,
    QueryContext, Result,
};
use vidya_llm::{LlmClient, LlmRequest};

use crate::contains_any;

pub const ID: &str = "study_assistant";

const STUDY_KEYWORDS: &[&str] = &[
    "explain",
    "solve",
    "how to",
    "what is",
    "why",
    "homework",
    "problem",
    "question",
    "understand",
    "learn",
    "teach",
    "example",
    "steps",
    "solution",
];

/// Display subject name and its trigger words, in detection order.
const SUBJECT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Mathematics",
        &["math", "algebra", "geometry", "calculus", "equation", "solve", "calculate"],
    ),
    (
        "Science",
        &["science", "physics", "chemistry", "biology", "experiment", "theory"],
    ),
    (
        "Social Science",
        &["history", "geography", "civics", "politics", "democracy"],
    ),
    ("English", &["english", "grammar", "essay", "literature", "poem"]),
];

const DEFAULT_GRADE: &str = "10";
const DEFAULT_PRACTICE_COUNT: u64 = 5;

const GENERAL_TIPS: &[&str] = &[
    "Study regularly in short sessions",
    "Take breaks every 30-45 minutes",
    "Teach concepts to others to strengthen understanding",
    "Make your own notes",
    "Practice active recall",
];

fn study_tips(subject: &str) -> &'static [&'static str] {
    match subject {
        "Mathematics" => &[
            "Practice daily - even 15 minutes helps",
            "Understand concepts before memorizing formulas",
            "Solve previous year questions",
            "Make a formula sheet for quick revision",
            "Learn from mistakes - review wrong answers",
        ],
        "Science" => &[
            "Connect theory with real-life examples",
            "Draw diagrams to understand concepts better",
            "Do experiments when possible",
            "Make notes in your own words",
            "Revise regularly with spaced repetition",
        ],
        "Social Science" => &[
            "Make timeline charts for history",
            "Use maps for geography topics",
            "Connect events with their causes and effects",
            "Make short notes for revision",
            "Practice answer writing",
        ],
        "English" => &[
            "Read daily - stories, newspapers, or books",
            "Practice writing short paragraphs",
            "Learn new words with their usage",
            "Speak English with friends for practice",
            "Listen to English content (audio/video)",
        ],
        _ => GENERAL_TIPS,
    }
}

/// First subject whose trigger words appear in the query.
pub fn detect_subject(query: &str) -> Option<&'static str> {
    let lowered = query.to_lowercase();
    SUBJECT_KEYWORDS
        .iter()
        .find(|(_, words)| contains_any(&lowered, words))
        .map(|(subject, _)| *subject)
}

fn educational_prompt(subject: &str, grade_level: &str, language: &str) -> String {
    format!(
        r#"You are a helpful study assistant for rural Indian students.

Context:
- Grade Level: {grade_level}
- Subject: {subject}
- Language: {language}
- Audience: rural students with varying literacy levels

Guidelines:
1. Give clear, simple explanations suitable for grade {grade_level}
2. Use examples from everyday and village life where possible
3. Break complex ideas into small steps
4. Respond in {language}; local terms are welcome where they help
5. Be encouraging
6. Keep it concise but complete

Math problems: show each step and the formula used.
Science topics: relate to daily observations and practical uses.
Other subjects: give definitions, analogies and examples."#
    )
}

pub struct StudyAssistantAgent {
    profile: AgentProfile,
    knowledge: Option<Arc<dyn KnowledgeLookup>>,
    llm: Option<Arc<dyn LlmClient>>,
    min_similarity: f32,
}

impl StudyAssistantAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Study Assistant Agent")
                .with_description(
                    "Helps with homework, explanations, problem solving, and study guidance",
                )
                .with_capabilities(vec![
                    AgentCapability::TextProcessing,
                    AgentCapability::ContentGeneration,
                    AgentCapability::Assessment,
                ])
                .with_priority(AgentPriority::High)
                .with_default_mode(AgentMode::Auto),
            knowledge: None,
            llm: None,
            min_similarity: 0.3,
        }
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeLookup>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    async fn answer_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let Some(kb) = self.knowledge.as_deref() else {
            return Ok(Envelope::failure(
                "Study assistant requires knowledge base for offline operation",
            )
            .with_error("Knowledge base not available"));
        };

        let detected = detect_subject(query);
        let subject = ctx.subject.as_deref().or(detected);
        let hits = kb.search(query, 3, Some(ctx.language()), subject).await?;

        if let Some(top) = hits.first().filter(|h| h.similarity > self.min_similarity) {
            let related: Vec<&str> = hits
                .iter()
                .skip(1)
                .take(2)
                .map(|h| h.question.as_str())
                .collect();
            return Ok(Envelope::answer(&top.answer)
                .with("question", top.question.as_str())
                .with(
                    "subject",
                    top.subject.as_deref().or(subject).unwrap_or("General"),
                )
                .with("confidence", top.similarity)
                .with("source", "cached_knowledge")
                .with("explanation", "This answer is from offline cached content.")
                .with("related_questions", related));
        }

        let topics: Vec<String> = match subject {
            Some(subject) => kb
                .get_syllabus_content(Some(subject), ctx.grade_level.as_deref(), None)
                .await?
                .into_iter()
                .take(5)
                .map(|item| item.topic)
                .collect(),
            None => Vec::new(),
        };

        Ok(Envelope::failure(
            "Detailed answer not available offline. Connect to internet for AI-powered explanations.",
        )
        .requiring_internet()
        .with_suggestion(
            "Try connecting to internet, or rephrase your question to match available topics.",
        )
        .with("query", query)
        .with("subject", subject.unwrap_or("Unknown"))
        .with("available_topics", topics)
        .with(
            "tip",
            "Offline mode works best for pre-loaded syllabus topics.",
        ))
    }

    async fn answer_online(
        &self,
        llm: &dyn LlmClient,
        query: &str,
        ctx: &QueryContext,
    ) -> Result<Envelope> {
        let subject = ctx
            .subject
            .as_deref()
            .or_else(|| detect_subject(query))
            .unwrap_or("General");
        let grade = ctx.grade_level.as_deref().unwrap_or(DEFAULT_GRADE);
        let request = LlmRequest::prompt(
            Some(educational_prompt(subject, grade, ctx.language())),
            format!("Student Question: {query}"),
        );

        let response = llm.complete(request).await?;
        info!(agent = ID, model = %response.model, "Generated online explanation");

        let related: Vec<Value> = match self.knowledge.as_deref() {
            Some(kb) => kb
                .search(query, 3, None, None)
                .await
                .unwrap_or_default()
                .into_iter()
                .map(|h| json!({ "question": h.question, "subject": h.subject }))
                .collect(),
            None => Vec::new(),
        };

        Ok(Envelope::answer(response.content)
            .with("question", query)
            .with("subject", subject)
            .with("grade_level", grade)
            .with("source", "ai_generated")
            .with("confidence", 0.9)
            .with(
                "explanation",
                "This answer was generated by AI based on your question.",
            )
            .with("related_content", related))
    }

    async fn practice_questions(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        let Some(llm) = self.llm.as_deref() else {
            return Ok(Envelope::failure("Practice questions need an internet connection")
                .requiring_internet()
                .with_error("Online mode required for generating practice questions"));
        };

        let topic = ctx.get_str("topic").unwrap_or(query);
        let difficulty = ctx.get_str("difficulty").unwrap_or("medium");
        let count = ctx.get_u64("count").unwrap_or(DEFAULT_PRACTICE_COUNT) as usize;
        let prompt = format!(
            "Generate {count} practice questions on the topic: {topic}\n\
             Difficulty level: {difficulty}\n\
             Format: number the questions 1-{count}, one per line.\n\
             Make them suitable for self-study."
        );

        let response = llm.complete(LlmRequest::prompt(None, prompt)).await?;
        let questions = numbered_lines(&response.content);
        let found = questions.len();

        Ok(Envelope::message("Practice these questions to improve your understanding")
            .with("topic", topic)
            .with("difficulty", difficulty)
            .with("count", found)
            .with(
                "questions",
                questions.into_iter().take(count).collect::<Vec<_>>(),
            ))
    }
}

impl Default for StudyAssistantAgent {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines that start with a question number.
fn numbered_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.chars().take(3).any(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

fn tips_envelope(query: &str, ctx: &QueryContext) -> Envelope {
    let subject = ctx
        .subject
        .as_deref()
        .or_else(|| detect_subject(query))
        .unwrap_or("General");
    Envelope::message("Consistent daily practice is more effective than last-minute studying.")
        .with("subject", subject)
        .with("tips", study_tips(subject).to_vec())
}

#[async_trait]
impl Agent for StudyAssistantAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, _ctx: &QueryContext) -> f32 {
        let lowered = query.to_lowercase();
        if contains_any(&lowered, STUDY_KEYWORDS) {
            0.95
        } else if detect_subject(query).is_some() {
            0.8
        } else if query.trim().ends_with('?') {
            0.6
        } else {
            0.4
        }
    }

    async fn process_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        match ctx.operation_or("answer") {
            "study_tips" => Ok(tips_envelope(query, ctx)),
            "practice_questions" => Ok(Envelope::failure(
                "Practice questions need an internet connection",
            )
            .requiring_internet()
            .with_error("Online mode required for generating practice questions")),
            _ => self.answer_offline(query, ctx).await,
        }
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        match ctx.operation_or("answer") {
            "study_tips" => return Ok(tips_envelope(query, ctx)),
            "practice_questions" => {
                return match self.practice_questions(query, ctx).await {
                    Ok(envelope) => Ok(envelope),
                    Err(e) => {
                        warn!(agent = ID, error = %e, "Practice question generation failed");
                        Ok(Envelope::failure("Could not generate practice questions")
                            .with_error(e.to_string()))
                    }
                };
            }
            _ => {}
        }

        let Some(llm) = self.llm.as_deref() else {
            warn!(agent = ID, "No remote AI configured, answering offline");
            return self.answer_offline(query, ctx).await;
        };

        match self.answer_online(llm, query, ctx).await {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                warn!(agent = ID, error = %e, "Remote AI failed, falling back to cached content");
                Ok(self
                    .answer_offline(query, ctx)
                    .await?
                    .with("note", "Online AI unavailable, using cached content"))
            }
        }
    }
}
