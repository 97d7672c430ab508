//! Questions bundled with the bot so a fresh database is playable.

use super::NewQuestion;

/// Sample board used to seed an empty database.
pub const SAMPLE_QUESTIONS: [NewQuestion<'static>; 5] = [
    NewQuestion {
        category: "WORLD CAPITALS",
        clue: "This city is the capital of France.",
        answer: "What is Paris?",
        value: Some(200),
        air_date: Some("2024-01-01"),
        round_type: Some("Jeopardy"),
        show_number: Some(1),
    },
    NewQuestion {
        category: "SCIENCE",
        clue: "This element has the chemical symbol \"O\".",
        answer: "What is oxygen?",
        value: Some(400),
        air_date: Some("2024-01-01"),
        round_type: Some("Jeopardy"),
        show_number: Some(1),
    },
    NewQuestion {
        category: "MOVIES",
        clue: "This 1994 film starred Tom Hanks as a man with a low IQ who witnesses historic events.",
        answer: "What is Forrest Gump?",
        value: Some(600),
        air_date: Some("2024-01-01"),
        round_type: Some("Jeopardy"),
        show_number: Some(1),
    },
    NewQuestion {
        category: "PRESIDENTS",
        clue: "This president was known as \"Honest Abe\".",
        answer: "Who is Abraham Lincoln?",
        value: Some(800),
        air_date: Some("2024-01-01"),
        round_type: Some("Double Jeopardy"),
        show_number: Some(1),
    },
    NewQuestion {
        category: "ANIMALS",
        clue: "This large mammal is known as the \"King of the Jungle\".",
        answer: "What is a lion?",
        value: Some(1000),
        air_date: Some("2024-01-01"),
        round_type: Some("Double Jeopardy"),
        show_number: Some(1),
    },
];
