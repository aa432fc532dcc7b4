use rand::Rng;
use serde::Serialize;

/// Heuristic scoring of one session transcript.
///
/// This is a stand-in for a real NLP model: the fluency score and the
/// advisory lists are deterministic functions of the text, while the
/// pronunciation score and the grammar remark are pseudo-random picks.
/// Callers depend only on this shape, so a real scorer can replace the
/// internals without touching them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub pronunciation_score: i64,
    pub fluency_score: i64,
    pub grammar_feedback: String,
    pub vocabulary_used: Vec<String>,
    pub improvements: Vec<String>,
    pub achievements: Vec<String>,
}

const GRAMMAR_REMARKS: [&str; 5] = [
    "Try using more linking words between your ideas",
    "Watch your verb tense agreement",
    "Try building some more complex sentences",
    "Excellent use of verb tenses",
    "Your sentence structure is improving",
];

const STOPLIST: [&str; 12] = [
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

pub fn analyze_transcript(transcript: &str) -> Analysis {
    analyze_transcript_with_rng(transcript, &mut rand::thread_rng())
}

pub fn analyze_transcript_with_rng<R: Rng>(transcript: &str, rng: &mut R) -> Analysis {
    match basic_analysis(transcript, rng) {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!("transcript analysis failed, using defaults: {e}");
            default_analysis()
        }
    }
}

fn basic_analysis<R: Rng>(transcript: &str, rng: &mut R) -> anyhow::Result<Analysis> {
    let folded = transcript.to_lowercase();
    let tokens: Vec<&str> = folded.split_whitespace().collect();

    let word_count = tokens.len();
    let unique_words = {
        let mut set = std::collections::HashSet::new();
        tokens.iter().filter(|t| set.insert(**t)).count()
    };
    let student_lines = transcript
        .lines()
        .filter(|line| {
            let l = line.to_lowercase();
            l.contains("user:") || l.contains("student:")
        })
        .count();

    let average_words_per_sentence = word_count as f64 / student_lines.max(1) as f64;

    let fluency_raw =
        word_count as f64 * 0.5 + unique_words as f64 * 0.3 + average_words_per_sentence * 2.0;
    let fluency_score = fluency_raw.clamp(0.0, 100.0).round() as i64;

    // Placeholder until a real pronunciation model exists: 70..100.
    let pronunciation_score = rng.gen_range(70..100);

    let grammar_feedback = GRAMMAR_REMARKS[rng.gen_range(0..GRAMMAR_REMARKS.len())].to_string();

    let vocabulary_used = extract_vocabulary(&tokens);
    let improvements = improvements_for(word_count, unique_words, transcript);
    let achievements = achievements_for(word_count, unique_words, fluency_score);

    Ok(Analysis {
        pronunciation_score,
        fluency_score,
        grammar_feedback,
        vocabulary_used,
        improvements,
        achievements,
    })
}

/// Up to 10 distinct tokens longer than 3 characters that are not common
/// filler words, in order of first appearance.
fn extract_vocabulary(tokens: &[&str]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for t in tokens {
        if t.chars().count() <= 3 || STOPLIST.contains(t) {
            continue;
        }
        if seen.insert(*t) {
            out.push(t.to_string());
            if out.len() == 10 {
                break;
            }
        }
    }
    out
}

fn improvements_for(word_count: usize, unique_words: usize, transcript: &str) -> Vec<String> {
    let mut out = Vec::new();

    if word_count < 50 {
        out.push("Try speaking for longer to get more practice in".to_string());
    }
    if word_count > 0 && (unique_words as f64 / word_count as f64) < 0.5 {
        out.push("Use a more varied vocabulary".to_string());
    }
    if !transcript.contains('?') {
        out.push("Don't hesitate to ask questions".to_string());
    }
    if out.is_empty() {
        out.push("Keep practicing regularly".to_string());
    }
    out
}

fn achievements_for(word_count: usize, unique_words: usize, fluency_score: i64) -> Vec<String> {
    let mut out = Vec::new();

    if word_count > 100 {
        out.push("Excellent participation - you spoke a lot!".to_string());
    }
    if unique_words > 30 {
        out.push("Rich and varied vocabulary".to_string());
    }
    if fluency_score > 80 {
        out.push("Impressive fluency".to_string());
    }
    if out.is_empty() {
        out.push("Good participation in the session".to_string());
    }
    out
}

/// Fallback when analysis itself fails; report creation must never block
/// on the scorer.
pub fn default_analysis() -> Analysis {
    Analysis {
        pronunciation_score: 75,
        fluency_score: 70,
        grammar_feedback: "Session completed successfully".to_string(),
        vocabulary_used: Vec::new(),
        improvements: Vec::new(),
        achievements: vec!["Good participation in the session".to_string()],
    }
}
