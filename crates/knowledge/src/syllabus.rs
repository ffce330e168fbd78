//! Syllabus parsing and study path planning.
//!
//! Topics are parsed from plain syllabus text, ordered into study paths that
//! respect prerequisites, and tracked per user with spaced-repetition review
//! dates.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, info};
use vidya_common::{
    Difficulty, GeneratedPath, ProgressUpdate, Result, ReviewTopic, StudyPathDetails,
    StudyPathItem, StudyPathRequest, StudyPlanner, SyllabusTopic, TopicStatus, VidyaError,
};

use crate::types::PlannerStats;

// "1. Topic", "2 Topic", "3.1 Topic"
static NUMBERED_TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s+(.+)$").unwrap());

// "A. Topic", "B) Topic"
static LETTERED_TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][.)]\s+(.+)$").unwrap());

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*•]\s*(.+)$").unwrap());

/// Days until review per mastery level of a completed topic.
const REVIEW_DAYS_PER_MASTERY: i64 = 7;

pub const DEFAULT_BOARD: &str = "CBSE";

/// A topic and its subtopics as read from syllabus text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTopic {
    pub topic: String,
    pub subtopics: Vec<String>,
}

/// Split syllabus text into topics.
///
/// Numbered or lettered lines start a topic. Bullet and plain lines that
/// follow belong to it as subtopics. A blank line closes the current topic.
/// A bullet with no open topic starts one.
pub fn parse_topics(text: &str) -> Vec<ParsedTopic> {
    let mut topics = Vec::new();
    let mut current: Option<ParsedTopic> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            topics.extend(current.take());
            continue;
        }

        let heading = NUMBERED_TOPIC
            .captures(line)
            .or_else(|| LETTERED_TOPIC.captures(line))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());

        if let Some(topic) = heading {
            topics.extend(current.take());
            current = Some(ParsedTopic {
                topic,
                subtopics: Vec::new(),
            });
            continue;
        }

        let body = BULLET
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());

        match current.as_mut() {
            Some(open) => open
                .subtopics
                .push(body.unwrap_or_else(|| line.to_string())),
            None => match body {
                Some(topic) => {
                    current = Some(ParsedTopic {
                        topic,
                        subtopics: Vec::new(),
                    })
                }
                None => debug!(line = %line, "Skipping syllabus line outside any topic"),
            },
        }
    }

    topics.extend(current);
    topics
}

#[derive(Debug, Clone)]
struct PathItemRecord {
    topic_id: u64,
    sequence_order: usize,
    status: TopicStatus,
    time_spent_minutes: u32,
}

#[derive(Debug, Clone)]
struct PathRecord {
    path_id: u64,
    user_id: String,
    path_name: String,
    subject: String,
    grade_level: String,
    duration_days: u32,
    items: Vec<PathItemRecord>,
}

#[derive(Debug, Clone)]
struct ProgressRecord {
    subject: String,
    status: TopicStatus,
    mastery_level: Option<u8>,
    last_studied: DateTime<Utc>,
    review_due: Option<DateTime<Utc>>,
    study_sessions: u32,
    total_time_minutes: u32,
}

/// (user_id, subject lowercased, topic)
type ProgressKey = (String, String, String);

#[derive(Default)]
struct PlannerState {
    topics: Vec<SyllabusTopic>,
    paths: Vec<PathRecord>,
    progress: HashMap<ProgressKey, ProgressRecord>,
    next_topic_id: u64,
    next_path_id: u64,
}

impl PlannerState {
    fn topic(&self, id: u64) -> Option<&SyllabusTopic> {
        self.topics.iter().find(|t| t.id == id)
    }

    fn topics_for(&self, subject: Option<&str>, grade_level: Option<&str>) -> Vec<SyllabusTopic> {
        self.topics
            .iter()
            .filter(|t| subject.map_or(true, |s| same(&t.subject, s)))
            .filter(|t| grade_level.map_or(true, |g| same(&t.grade_level, g)))
            .cloned()
            .collect()
    }

    fn details(&self, path: &PathRecord) -> StudyPathDetails {
        let items: Vec<StudyPathItem> = path
            .items
            .iter()
            .filter_map(|item| self.item(item))
            .collect();
        let completed = items
            .iter()
            .filter(|i| i.status == TopicStatus::Completed)
            .count();
        let progress_percentage = if items.is_empty() {
            0.0
        } else {
            completed as f32 / items.len() as f32 * 100.0
        };

        StudyPathDetails {
            path_id: path.path_id,
            user_id: path.user_id.clone(),
            path_name: path.path_name.clone(),
            subject: path.subject.clone(),
            grade_level: path.grade_level.clone(),
            duration_days: path.duration_days,
            total_topics: items.len(),
            completed_topics: completed,
            progress_percentage,
            items,
        }
    }

    fn item(&self, record: &PathItemRecord) -> Option<StudyPathItem> {
        let topic = self.topic(record.topic_id)?;
        Some(StudyPathItem {
            topic_id: topic.id,
            topic: topic.topic.clone(),
            sequence_order: record.sequence_order,
            status: record.status,
            subtopics: topic.subtopics.clone(),
            description: topic.description.clone(),
            difficulty: topic.difficulty,
            estimated_hours: topic.estimated_hours,
        })
    }
}

fn same(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Order topics for study: beginner topics without prerequisites first, then
/// rounds of topics whose prerequisites are met, then whatever is left.
/// Topics already completed are skipped and count as met prerequisites.
pub fn order_topics(topics: &[SyllabusTopic], completed: &HashSet<String>) -> Vec<SyllabusTopic> {
    let mut ordered: Vec<SyllabusTopic> = Vec::new();
    let mut placed: HashSet<u64> = HashSet::new();

    for topic in topics {
        if completed.contains(&topic.topic) {
            continue;
        }
        if topic.prerequisites.is_empty() && topic.difficulty == Some(Difficulty::Beginner) {
            placed.insert(topic.id);
            ordered.push(topic.clone());
        }
    }

    let mut remaining: Vec<&SyllabusTopic> = topics
        .iter()
        .filter(|t| !placed.contains(&t.id) && !completed.contains(&t.topic))
        .collect();

    let max_rounds = remaining.len() + 1;
    for _ in 0..max_rounds {
        if remaining.is_empty() {
            break;
        }
        let mut still_waiting = Vec::new();
        for topic in remaining {
            let ready = topic.prerequisites.iter().all(|p| {
                completed.contains(p) || ordered.iter().any(|o| &o.topic == p)
            });
            if ready {
                ordered.push(topic.clone());
            } else {
                still_waiting.push(topic);
            }
        }
        remaining = still_waiting;
    }

    ordered.extend(remaining.into_iter().cloned());
    ordered
}

pub struct InMemorySyllabusPlanner {
    state: RwLock<PlannerState>,
}

impl InMemorySyllabusPlanner {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PlannerState::default()),
        }
    }

    /// Store a topic and return its assigned id. Any id on the input is replaced.
    pub async fn add_topic(&self, mut topic: SyllabusTopic) -> u64 {
        let mut state = self.state.write().await;
        state.next_topic_id += 1;
        topic.id = state.next_topic_id;
        let id = topic.id;
        state.topics.push(topic);
        id
    }

    /// Parse syllabus text and store every topic found.
    pub async fn parse_syllabus_text(
        &self,
        text: &str,
        subject: &str,
        grade_level: &str,
        board: &str,
    ) -> Vec<SyllabusTopic> {
        let parsed = parse_topics(text);
        let mut stored = Vec::with_capacity(parsed.len());
        for p in parsed {
            let mut topic = SyllabusTopic {
                id: 0,
                subject: subject.to_string(),
                grade_level: grade_level.to_string(),
                board: board.to_string(),
                topic: p.topic,
                subtopics: p.subtopics,
                description: None,
                difficulty: None,
                estimated_hours: None,
                prerequisites: Vec::new(),
            };
            topic.id = self.add_topic(topic.clone()).await;
            stored.push(topic);
        }
        info!(
            subject = %subject,
            grade_level = %grade_level,
            topics = stored.len(),
            "Parsed syllabus"
        );
        stored
    }

    /// Completed topics whose review date is at or before `now`, earliest first.
    pub async fn get_topics_due_for_review_at(
        &self,
        user_id: &str,
        subject: Option<&str>,
        now: DateTime<Utc>,
    ) -> Vec<ReviewTopic> {
        let state = self.state.read().await;
        let mut due: Vec<ReviewTopic> = state
            .progress
            .iter()
            .filter(|((user, subj, _), _)| {
                user == user_id && subject.map_or(true, |s| same(subj, s))
            })
            .filter_map(|((_, _, topic), record)| {
                let review_due = record.review_due?;
                (record.status == TopicStatus::Completed && review_due <= now).then(|| {
                    ReviewTopic {
                        topic: topic.clone(),
                        subject: record.subject.clone(),
                        last_studied: record.last_studied,
                        mastery_level: record.mastery_level,
                        review_due,
                    }
                })
            })
            .collect();
        due.sort_by(|a, b| a.review_due.cmp(&b.review_due));
        due
    }

    /// Study sessions and minutes logged for one topic.
    pub async fn topic_effort(&self, user_id: &str, subject: &str, topic: &str) -> Option<(u32, u32)> {
        let state = self.state.read().await;
        state
            .progress
            .get(&(user_id.to_string(), subject.to_lowercase(), topic.to_string()))
            .map(|r| (r.study_sessions, r.total_time_minutes))
    }

    pub async fn stats(&self) -> PlannerStats {
        let state = self.state.read().await;
        let mut stats = PlannerStats {
            total_topics: state.topics.len(),
            total_paths: state.paths.len(),
            ..Default::default()
        };
        for topic in &state.topics {
            *stats
                .by_subject_grade
                .entry(format!("{}/{}", topic.subject, topic.grade_level))
                .or_default() += 1;
        }
        stats.active_users = state
            .progress
            .keys()
            .map(|(user, _, _)| user.as_str())
            .collect::<HashSet<_>>()
            .len();
        stats
    }
}

impl Default for InMemorySyllabusPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudyPlanner for InMemorySyllabusPlanner {
    async fn get_syllabus_topics(
        &self,
        subject: Option<&str>,
        grade_level: Option<&str>,
    ) -> Result<Vec<SyllabusTopic>> {
        Ok(self.state.read().await.topics_for(subject, grade_level))
    }

    async fn generate_optimal_study_path(
        &self,
        request: &StudyPathRequest,
    ) -> Result<GeneratedPath> {
        let mut state = self.state.write().await;

        let topics = state.topics_for(Some(&request.subject), Some(&request.grade_level));
        if topics.is_empty() {
            return Err(VidyaError::Collaborator(format!(
                "No topics found for {} grade {}",
                request.subject, request.grade_level
            )));
        }

        let subject_key = request.subject.to_lowercase();
        let completed: HashSet<String> = state
            .progress
            .iter()
            .filter(|((user, subj, _), r)| {
                user == &request.user_id && subj == &subject_key && r.status == TopicStatus::Completed
            })
            .map(|((_, _, topic), _)| topic.clone())
            .collect();

        let ordered = order_topics(&topics, &completed);

        state.next_path_id += 1;
        let path_id = state.next_path_id;
        let weeks = request.target_weeks;
        state.paths.push(PathRecord {
            path_id,
            user_id: request.user_id.clone(),
            path_name: format!("{} - {} Complete Path", request.subject, request.grade_level),
            subject: request.subject.clone(),
            grade_level: request.grade_level.clone(),
            duration_days: weeks.saturating_mul(7),
            items: ordered
                .iter()
                .enumerate()
                .map(|(i, t)| PathItemRecord {
                    topic_id: t.id,
                    sequence_order: i + 1,
                    status: TopicStatus::NotStarted,
                    time_spent_minutes: 0,
                })
                .collect(),
        });

        info!(
            path_id,
            user = %request.user_id,
            subject = %request.subject,
            topics = ordered.len(),
            "Generated study path"
        );

        Ok(GeneratedPath {
            path_id,
            total_topics: ordered.len(),
            estimated_hours: request.available_hours_per_week * weeks as f32,
            weeks,
        })
    }

    async fn get_study_path_details(&self, path_id: u64) -> Result<Option<StudyPathDetails>> {
        let state = self.state.read().await;
        Ok(state
            .paths
            .iter()
            .find(|p| p.path_id == path_id)
            .map(|p| state.details(p)))
    }

    async fn get_user_paths(
        &self,
        user_id: &str,
        subject: Option<&str>,
    ) -> Result<Vec<StudyPathDetails>> {
        let state = self.state.read().await;
        Ok(state
            .paths
            .iter()
            .filter(|p| p.user_id == user_id && subject.map_or(true, |s| same(&p.subject, s)))
            .map(|p| state.details(p))
            .collect())
    }

    async fn update_topic_progress(&self, update: ProgressUpdate) -> Result<()> {
        let now = Utc::now();
        let review_due = match (update.status, update.mastery_level) {
            (TopicStatus::Completed, Some(m)) if m > 0 => {
                Some(now + Duration::days(REVIEW_DAYS_PER_MASTERY * i64::from(m)))
            }
            _ => None,
        };

        let mut state = self.state.write().await;
        let key = (
            update.user_id.clone(),
            update.subject.to_lowercase(),
            update.topic.clone(),
        );
        let record = state.progress.entry(key).or_insert(ProgressRecord {
            subject: update.subject.clone(),
            status: update.status,
            mastery_level: None,
            last_studied: now,
            review_due: None,
            study_sessions: 0,
            total_time_minutes: 0,
        });
        record.status = update.status;
        record.mastery_level = update.mastery_level;
        record.last_studied = now;
        record.review_due = review_due;
        record.study_sessions = record.study_sessions.saturating_add(1);
        record.total_time_minutes = record
            .total_time_minutes
            .saturating_add(update.time_spent_minutes);

        let topic_ids: HashSet<u64> = state
            .topics
            .iter()
            .filter(|t| same(&t.subject, &update.subject) && t.topic == update.topic)
            .map(|t| t.id)
            .collect();
        for path in state
            .paths
            .iter_mut()
            .filter(|p| p.user_id == update.user_id && same(&p.subject, &update.subject))
        {
            for item in path.items.iter_mut().filter(|i| topic_ids.contains(&i.topic_id)) {
                item.status = update.status;
                item.time_spent_minutes =
                    item.time_spent_minutes.saturating_add(update.time_spent_minutes);
            }
        }

        debug!(
            user = %update.user_id,
            subject = %update.subject,
            topic = %update.topic,
            status = ?update.status,
            "Updated topic progress"
        );
        Ok(())
    }

    async fn get_next_topic(&self, path_id: u64) -> Result<Option<StudyPathItem>> {
        let state = self.state.read().await;
        let Some(path) = state.paths.iter().find(|p| p.path_id == path_id) else {
            return Ok(None);
        };
        Ok(path
            .items
            .iter()
            .filter(|i| i.status != TopicStatus::Completed)
            .find_map(|i| state.item(i)))
    }

    async fn get_topics_due_for_review(
        &self,
        user_id: &str,
        subject: Option<&str>,
    ) -> Result<Vec<ReviewTopic>> {
        Ok(self
            .get_topics_due_for_review_at(user_id, subject, Utc::now())
            .await)
    }
}
