//! Static exam modules and study videos. The topic context strings are sent
//! verbatim to the question generator.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestConfig {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub topic_context: &'static str,
    pub question_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StudyMaterial {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub thumbnail: &'static str,
    pub topic_context: &'static str,
}

pub const STANDARD_QUESTION_COUNT: usize = 15;
pub const SIMULATION_QUESTION_COUNT: usize = 30;
pub const VIDEO_QUEST_QUESTION_COUNT: usize = 5;

impl StudyMaterial {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

pub const TESTS: &[TestConfig] = &[
    TestConfig {
        id: "work",
        title: "Work & Income",
        description: "15 Questions: Finding a job, contracts, taxes.",
        topic_context: "Work, employment contracts, income tax, finding a job, workplace culture, UWV, unions, working hours, calling in sick.",
        question_count: STANDARD_QUESTION_COUNT,
    },
    TestConfig {
        id: "health",
        title: "Healthcare",
        description: "15 Questions: GP, insurance, emergency services.",
        topic_context: "Healthcare system, health insurance (zorgverzekering), GP (huisarts), hospitals, emergency care (spoedeisende hulp), pharmacy (apotheek), eigen risico.",
        question_count: STANDARD_QUESTION_COUNT,
    },
    TestConfig {
        id: "education",
        title: "Education",
        description: "15 Questions: School system, leerplicht, degrees.",
        topic_context: "Dutch education system, primary school, secondary school (VMBO, HAVO, VWO), leerplicht, vocational training (MBO), higher education (HBO, WO).",
        question_count: STANDARD_QUESTION_COUNT,
    },
    TestConfig {
        id: "history",
        title: "History & Geo",
        description: "15 Questions: Events, geography, provinces.",
        topic_context: "Dutch history, Eighty Years War, William of Orange, World War II, geography, provinces, Randstad, water management, Delta Works.",
        question_count: STANDARD_QUESTION_COUNT,
    },
    TestConfig {
        id: "politics",
        title: "Politics",
        description: "15 Questions: Democracy, King, Constitution.",
        topic_context: "Dutch politics, democracy, constitution (Grondwet), King, Parliament (Tweede Kamer, Eerste Kamer), elections, municipalities (gemeente), freedom of speech.",
        question_count: STANDARD_QUESTION_COUNT,
    },
    TestConfig {
        id: "social",
        title: "Social Norms",
        description: "15 Questions: Customs, equality, neighbors.",
        topic_context: "Social norms, omgangsvormen, equality, freedom of religion, discrimination, rights and obligations, interacting with neighbors.",
        question_count: STANDARD_QUESTION_COUNT,
    },
    TestConfig {
        id: "housing",
        title: "Housing",
        description: "15 Questions: Renting, buying, utilities.",
        topic_context: "Housing, renting, buying, social housing, utilities (gas, water, electricity), waste separation, neighborhood rules, VvE.",
        question_count: STANDARD_QUESTION_COUNT,
    },
    TestConfig {
        id: "mixed",
        title: "Exam Sim",
        description: "30 Questions: Full exam simulation.",
        topic_context: "A generic mix of all KNM topics: Work, Health, Education, History, Politics, Social Norms, Housing.",
        question_count: SIMULATION_QUESTION_COUNT,
    },
];

pub const STUDY_MATERIALS: &[StudyMaterial] = &[
    StudyMaterial {
        id: "_eRgrWUG1ks",
        title: "Level 1: Work & Values",
        description: "Master the basics of Dutch working culture, income, and core values.",
        thumbnail: "https://img.youtube.com/vi/_eRgrWUG1ks/mqdefault.jpg",
        topic_context: "Dutch labor market, applying for jobs, employment contracts (vast/tijdelijk), income tax, uitkering, Dutch core values, freedom of religion, equality, participation statement.",
    },
    StudyMaterial {
        id: "p4gMdOqgeQQ",
        title: "Level 2: Health & School",
        description: "Learn how the healthcare and education systems work.",
        thumbnail: "https://img.youtube.com/vi/p4gMdOqgeQQ/mqdefault.jpg",
        topic_context: "Dutch healthcare system, mandatory health insurance (basisverzekering), GP (huisarts), eigen risico, apotheek, consultatiebureau, Dutch education system, leerplicht, primary school, VMBO/HAVO/VWO, MBO/HBO/WO.",
    },
    StudyMaterial {
        id: "F8e334kqY-g",
        title: "Level 3: Practice Scenario A",
        description: "Test your skills with real exam-style practice questions.",
        thumbnail: "https://img.youtube.com/vi/F8e334kqY-g/mqdefault.jpg",
        topic_context: "A mix of recent KNM exam questions covering work, health, education, and social norms. Focus on situational judgment.",
    },
    StudyMaterial {
        id: "jQywBU031Hg",
        title: "Level 4: Practice Scenario B",
        description: "Intermediate practice questions to test your knowledge.",
        thumbnail: "https://img.youtube.com/vi/jQywBU031Hg/mqdefault.jpg",
        topic_context: "Diverse KNM topics including history, geography, politics, and daily life situations in the Netherlands.",
    },
    StudyMaterial {
        id: "ewFOqj7Rf6I",
        title: "Level 5: Advanced Scenarios",
        description: "Complex situations and difficult questions.",
        thumbnail: "https://img.youtube.com/vi/ewFOqj7Rf6I/mqdefault.jpg",
        topic_context: "Complex KNM scenarios, norms and values, difficult work situations, and housing rules.",
    },
];

pub fn find_test(id: &str) -> Option<&'static TestConfig> {
    TESTS.iter().find(|t| t.id == id)
}

pub fn find_video(id: &str) -> Option<&'static StudyMaterial> {
    STUDY_MATERIALS.iter().find(|v| v.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_simulation_asks_for_thirty() {
        for test in TESTS {
            let expected = if test.id == "mixed" { 30 } else { 15 };
            assert_eq!(test.question_count, expected, "{}", test.id);
        }
    }

    #[test]
    fn lookups_by_id() {
        assert_eq!(find_test("work").map(|t| t.title), Some("Work & Income"));
        assert!(find_test("nope").is_none());
        let video = find_video("p4gMdOqgeQQ").unwrap();
        assert_eq!(video.watch_url(), "https://www.youtube.com/watch?v=p4gMdOqgeQQ");
    }
}
