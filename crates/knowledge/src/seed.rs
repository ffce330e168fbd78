//! Default offline content: app help, common Q&A and class 10 syllabi.

use serde::Serialize;
use tracing::info;

use crate::knowledge_base::InMemoryKnowledgeBase;
use crate::syllabus::{InMemorySyllabusPlanner, DEFAULT_BOARD};
use crate::types::NewKnowledge;

/// (question, answer, category, keywords)
const APP_FAQS: &[(&str, &str, &str, &str)] = &[
    (
        "How do I use this app?",
        "This is the Rural Education app. You can open your timetable, notes, e-books and AI study tools. Use the bottom navigation to switch sections. Voice commands work too: tap the microphone icon.",
        "navigation",
        "how to use, getting started, navigation",
    ),
    (
        "How do I view my timetable?",
        "Open Timetable from the home screen. You can see daily schedules, add classes and set reminders. Swipe left or right to change days.",
        "timetable",
        "timetable, schedule, classes",
    ),
    (
        "How do I scan and save notes?",
        "Tap Notes > Scan and photograph your handwritten notes. The app converts them to text with OCR so you can edit and save them.",
        "notes",
        "scan, notes, OCR, handwriting",
    ),
    (
        "Can I use this app offline?",
        "Yes. Notes, timetable, saved e-books and the basic study assistant all work offline. Video recommendations need internet.",
        "offline",
        "offline, no internet, without wifi",
    ),
    (
        "How does voice input work?",
        "Tap the microphone icon anywhere in the app and speak your question in Hindi, English or Punjabi.",
        "voice",
        "voice, speak, microphone, audio",
    ),
    (
        "What is Photomath feature?",
        "Photomath solves math problems from a photo. Point the camera at the problem, tap capture and get a step-by-step solution.",
        "photomath",
        "math, solve, camera, calculator",
    ),
    (
        "How do I share notes using QR code?",
        "Open the note > Share > QR Code. Your friend scans the code to receive the note directly, no internet needed.",
        "sharing",
        "QR code, share, send, transfer",
    ),
    (
        "How do I scan QR code to receive notes?",
        "Go to Notes > Scan QR and point the camera at the code. The note is received and saved automatically.",
        "sharing",
        "receive, scan QR, get notes",
    ),
    (
        "Is my data safe?",
        "Yes. Your data is encrypted and stored securely and is never shared with third parties. See Settings > Privacy.",
        "privacy",
        "safety, secure, privacy, data protection",
    ),
    (
        "How do I change language?",
        "Go to Settings > Language and pick English, Hindi or Punjabi. The whole app switches to that language.",
        "settings",
        "language, hindi, punjabi, translate",
    ),
    (
        "What can the study assistant help me with?",
        "The study assistant explains topics, solves problems, makes quizzes, builds study plans and answers doubts about your syllabus.",
        "study",
        "AI, assistant, help, study, learn",
    ),
    (
        "Can I get video recommendations?",
        "Yes. When online, the app recommends educational YouTube videos for the topics you are studying.",
        "videos",
        "youtube, videos, recommendations, watch",
    ),
    (
        "App is running slow, what should I do?",
        "Clear the cache from Settings > Storage, close other apps, restart the app and update to the latest version. The app is built for low-end phones.",
        "troubleshooting",
        "slow, lag, performance, fix",
    ),
    (
        "Why can't I connect to internet?",
        "Most features work offline. For online features check your WiFi or mobile data; the app works even on 2G. An indicator at the top shows when you are offline.",
        "troubleshooting",
        "internet, connection, wifi, network",
    ),
];

/// (question, answer, subject, grade, keywords)
const QA_PAIRS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "What is photosynthesis?",
        "Photosynthesis is how green plants make food using sunlight, water and carbon dioxide. Chlorophyll absorbs light to turn CO2 and H2O into glucose and oxygen: 6CO2 + 6H2O + light → C6H12O6 + 6O2.",
        "Science",
        "8-10",
        "photosynthesis, plants, chlorophyll, biology",
    ),
    (
        "What is Newton's First Law of Motion?",
        "An object at rest stays at rest and an object in motion keeps moving at the same speed and direction unless an external force acts on it. It is also called the Law of Inertia.",
        "Physics",
        "8-10",
        "newton, motion, inertia, physics, force",
    ),
    (
        "What is the water cycle?",
        "The water cycle is the continuous movement of water on Earth: evaporation, condensation into clouds, precipitation as rain or snow, and collection in water bodies.",
        "Science",
        "6-8",
        "water cycle, evaporation, rain, condensation",
    ),
    (
        "What is the Pythagorean theorem?",
        "In a right triangle the square of the hypotenuse equals the sum of the squares of the other two sides: a² + b² = c². With sides 3 and 4 the hypotenuse is 5.",
        "Mathematics",
        "8-10",
        "pythagoras, triangle, geometry, theorem",
    ),
    (
        "How do you find the area of a circle?",
        "Area = πr². With radius 7 cm, area = 22/7 × 7 × 7 = 154 cm². If you know the diameter, halve it first.",
        "Mathematics",
        "6-10",
        "circle, area, radius, geometry, pi",
    ),
    (
        "What is democracy?",
        "Democracy is government by the people, who elect representatives by voting. It rests on free elections, fundamental rights, rule of law and equality. India is the world's largest democracy.",
        "Social Science",
        "8-10",
        "democracy, government, voting, politics, civics",
    ),
    (
        "What caused the Indian Independence Movement?",
        "Colonial exploitation, economic drain, discriminatory policies and denial of rights. Leaders included Mahatma Gandhi, Jawaharlal Nehru and Subhas Chandra Bose. India became independent on 15 August 1947.",
        "History",
        "8-10",
        "independence, freedom, gandhi, british, india",
    ),
    (
        "What are the parts of speech in English?",
        "There are eight: noun, pronoun, verb, adjective, adverb, preposition, conjunction and interjection.",
        "English",
        "6-10",
        "grammar, parts of speech, english, noun, verb",
    ),
    (
        "What is an atom?",
        "An atom is the smallest unit of matter: a nucleus of protons and neutrons with electrons around it. Atoms combine to form molecules.",
        "Chemistry",
        "8-10",
        "atom, molecule, proton, electron, chemistry",
    ),
    (
        "What is the periodic table?",
        "The periodic table arranges the 118 known elements by atomic number and properties. Elements in the same group behave alike. Hydrogen is the simplest, with one proton.",
        "Chemistry",
        "8-10",
        "periodic table, elements, chemistry, mendeleev",
    ),
];

/// (subject, grade, topic, content, difficulty)
const SYLLABUS_CONTENT: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Science",
        "10",
        "Chemical Reactions and Equations",
        "Chemical reactions, balancing equations, combination, decomposition, displacement and redox reactions, and reactions in everyday life.",
        "intermediate",
    ),
    (
        "Science",
        "10",
        "Life Processes",
        "Nutrition, respiration, transportation and excretion in plants and animals.",
        "intermediate",
    ),
    (
        "Science",
        "10",
        "Electricity",
        "Electric current, potential difference, Ohm's law, resistance, series and parallel circuits, heating effect and electric power.",
        "advanced",
    ),
    (
        "Mathematics",
        "10",
        "Real Numbers",
        "Euclid's division lemma, HCF and LCM, rational and irrational numbers, decimal expansions and the fundamental theorem of arithmetic.",
        "beginner",
    ),
    (
        "Mathematics",
        "10",
        "Polynomials",
        "Zeroes of a polynomial, relationship between zeroes and coefficients, division algorithm for polynomials.",
        "intermediate",
    ),
    (
        "Mathematics",
        "10",
        "Quadratic Equations",
        "Standard form, factorization, completing the square, the quadratic formula and nature of roots.",
        "advanced",
    ),
    (
        "Social Science",
        "9",
        "The French Revolution",
        "Causes of the revolution, events of 1789, the Declaration of Rights, the rise of Napoleon and its legacy.",
        "intermediate",
    ),
    (
        "Social Science",
        "9",
        "India: Size and Location",
        "India's position, neighbours, states and union territories, physical features and climate.",
        "beginner",
    ),
];

pub const SCIENCE_10_SYLLABUS: &str = "
1. Chemical Reactions and Equations
   - Types of chemical reactions
   - Balancing chemical equations
   - Effects of oxidation in everyday life

2. Acids, Bases and Salts
   - Understanding pH scale
   - Properties of acids and bases
   - Common salt and its compounds

3. Metals and Non-metals
   - Physical and chemical properties
   - Reactivity series
   - Extraction of metals

4. Life Processes
   - Nutrition in plants and animals
   - Respiration
   - Transportation
   - Excretion

5. Control and Coordination
   - Nervous system
   - Hormones in animals
   - Plant hormones

6. Electricity
   - Electric current and circuit
   - Ohm's law
   - Resistance and factors affecting it
   - Heating effect of electric current

7. Light - Reflection and Refraction
   - Reflection by spherical mirrors
   - Refraction of light
   - Lens formula and magnification
";

pub const MATHEMATICS_10_SYLLABUS: &str = "
1. Real Numbers
   - Euclid's division lemma
   - Fundamental theorem of arithmetic
   - Revisiting rational and irrational numbers

2. Polynomials
   - Geometrical meaning of zeroes
   - Relationship between zeroes and coefficients
   - Division algorithm for polynomials

3. Pair of Linear Equations in Two Variables
   - Algebraic methods of solving
   - Graphical method
   - Equations reducible to linear form

4. Quadratic Equations
   - Standard form
   - Solution by factorization
   - Solution by completing the square
   - Nature of roots

5. Arithmetic Progressions
   - Introduction to AP
   - nth term of an AP
   - Sum of first n terms

6. Triangles
   - Similar triangles
   - Criteria for similarity
   - Pythagoras theorem
";

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedSummary {
    pub faqs: usize,
    pub knowledge: usize,
    pub syllabus_content: usize,
    pub syllabus_topics: usize,
}

pub async fn populate_knowledge_base(kb: &InMemoryKnowledgeBase) -> SeedSummary {
    for (question, answer, category, keywords) in APP_FAQS {
        kb.add_app_faq(*question, *answer, *category, *keywords).await;
    }
    for (question, answer, subject, grade, keywords) in QA_PAIRS {
        kb.add_knowledge(
            NewKnowledge::new(*question, *answer)
                .with_category("education")
                .with_subject(*subject)
                .with_grade_level(*grade)
                .with_keywords(*keywords),
        )
        .await;
    }
    for (subject, grade, topic, content, difficulty) in SYLLABUS_CONTENT {
        kb.add_syllabus_content(*subject, *grade, *topic, *content, *difficulty)
            .await;
    }

    SeedSummary {
        faqs: APP_FAQS.len(),
        knowledge: QA_PAIRS.len(),
        syllabus_content: SYLLABUS_CONTENT.len(),
        syllabus_topics: 0,
    }
}

pub async fn populate_syllabus(planner: &InMemorySyllabusPlanner) -> usize {
    let science = planner
        .parse_syllabus_text(SCIENCE_10_SYLLABUS, "Science", "10", DEFAULT_BOARD)
        .await;
    let maths = planner
        .parse_syllabus_text(MATHEMATICS_10_SYLLABUS, "Mathematics", "10", DEFAULT_BOARD)
        .await;
    science.len() + maths.len()
}

/// Load every default dataset into the given stores.
pub async fn populate_all(
    kb: &InMemoryKnowledgeBase,
    planner: &InMemorySyllabusPlanner,
) -> SeedSummary {
    let mut summary = populate_knowledge_base(kb).await;
    summary.syllabus_topics = populate_syllabus(planner).await;
    info!(
        faqs = summary.faqs,
        knowledge = summary.knowledge,
        syllabus_content = summary.syllabus_content,
        syllabus_topics = summary.syllabus_topics,
        "Seeded offline content"
    );
    summary
}
