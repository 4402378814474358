//! System prompt construction for the interpreter voice.
//!
//! The prompt is assembled from fixed layers:
//!
//! 1. **Preamble**: engine mode, interpreter role, and target language.
//! 2. **Pace**: chosen by comparing the speech rate against `1.0`.
//! 3. **Protocols**: audio style tags, non-conversational rules, objective,
//!    and pronunciation guidance.
//! 4. **Persona**: one of six blocks selected by [`VoiceStyle`].
//! 5. **Closing directive** ([`CLOSING_DIRECTIVE`]).
//!
//! [`build_prompt`] is pure. Callers rebuild on every settings change rather
//! than caching the result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Locale used in the header when no language is given.
pub const TAGLISH_LOCALE: &str = "Taglish (Philippines)";

/// Pace clause used when the rate is exactly `1.0`.
pub const NATURAL_PACE: &str = "PACE: Natural, conversational speed.";

/// Last line of every prompt.
pub const CLOSING_DIRECTIVE: &str = "PERFORM THE TRANSLATION NOW.";

const AUDIO_TAG_PROTOCOL: &str = "\
⛔️ AUDIO STYLE TAGS PROTOCOL (CRITICAL):
1. The input text contains audio style tags enclosed in parentheses (...).
   Examples: (excitedly), (soft inhale), (pause), (clears throat), (slowly).
2. **THESE ARE SILENT INSTRUCTIONS FOR THE ACTOR.**
3. **NEVER READ THE TAGS ALOUD.** 
   - Incorrect: \"Excitedly, hello there.\"
   - Correct: \"Hello there!\" (spoken in an excited tone)
4. **ACT OUT NON-VERBAL TAGS.**
   - If input is \"(clears throat)\", make the sound *hrrrm*, do NOT say \"clears throat\".
   - If input is \"(soft inhale)\", take a breath.";

const NON_CONVERSATIONAL_PROTOCOL: &str = "\
⛔️ NON-CONVERSATIONAL PROTOCOL (STRICT):
1. You are NOT a chatbot. You are NOT a conversational partner.
2. You must NOT reply to the text. You must NOT ask questions.
3. You must NOT say \"Okay\", \"Sure\", \"Here is the translation\", or \"I understand\".
4. You must IMMEDIATELY perform the translation of the input text into audio.";

const PRONUNCIATION_PROTOCOL: &str = "\
PRONUNCIATION & VOCABULARY PROTOCOL:
1. **Native Authenticity**: You MUST adopt the exact accent, intonation, and phonology of a native speaker of the target locale. 
2. **Vocabulary Precision**: Use accurate local terminology, slang, and idioms appropriate for the region.
3. **Specific Handling**:
   - If [Taglish (Philippines)] is selected, you must naturally mix English and Tagalog (code-switching) as a native Manileño would.
4. **Natural Delivery**: Speak as a human, not a machine. Include natural breath pauses.";

const PERSONA_NATURAL: &str = "\
VOICE PERSONA (The Balanced Speaker):
- **Tone**: Clear, neutral but engaging, and human-like.
- **Rhythm**: Standard conversational pace with natural breathing.
- **Attitude**: Helpful, polite, present.";

const PERSONA_CONVERSATIONAL: &str = "\
VOICE PERSONA (The Friendly Peer):
- **Tone**: Warm, approachable, casual, and relaxed.
- **Rhythm**: Natural, with colloquial phrasing and comfortable pauses.
- **Attitude**: Friendly, chatty, relatable.";

const PERSONA_FORMAL: &str = "\
VOICE PERSONA (The Professional Anchor):
- **Tone**: Objective, precise, clear, and composed.
- **Diction**: Crisp articulation, avoiding slang or fillers.
- **Rhythm**: Steady, even-paced, and authoritative.
- **Attitude**: Professional, trustworthy, informative.";

const PERSONA_ENTHUSIASTIC: &str = "\
VOICE PERSONA (The Energetic Host):
- **Tone**: Bright, high-energy, eager, and smiling.
- **Dynamics**: Varied pitch to express excitement and positivity.
- **Rhythm**: Upbeat and slightly faster, with punchy emphasis.
- **Attitude**: Cheerful, motivating, engaging.";

const PERSONA_BREATHY: &str = "\
VOICE PERSONA (The Intimate Storyteller):
- **Tone**: Soft, airy, close-to-mic, and confidential.
- **Dynamics**: Gentle whispers to soft speaking.
- **Attitude**: Calm, soothing, mysterious.";

const PERSONA_DRAMATIC: &str = "\
VOICE PERSONA (The Movie Trailer Voice):
- **Tone**: Deep, gravelly, epic, and suspenseful.
- **Rhythm**: Slow, deliberate, with heavy pauses for effect.
- **Attitude**: Serious, intense, cinematic.";

/// Delivery persona for the synthesized voice.
///
/// Parsing is total: any name that is not one of the six styles maps to
/// [`VoiceStyle::Natural`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VoiceStyle {
    #[default]
    Natural,
    Conversational,
    Formal,
    Enthusiastic,
    Breathy,
    Dramatic,
}

impl VoiceStyle {
    /// All styles in display order.
    pub const ALL: [Self; 6] = [
        Self::Natural,
        Self::Conversational,
        Self::Formal,
        Self::Enthusiastic,
        Self::Breathy,
        Self::Dramatic,
    ];

    /// Wire name of the style.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Conversational => "conversational",
            Self::Formal => "formal",
            Self::Enthusiastic => "enthusiastic",
            Self::Breathy => "breathy",
            Self::Dramatic => "dramatic",
        }
    }

    /// Parse a style name, falling back to `Natural` for anything unknown.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "conversational" => Self::Conversational,
            "formal" => Self::Formal,
            "enthusiastic" => Self::Enthusiastic,
            "breathy" => Self::Breathy,
            "dramatic" => Self::Dramatic,
            _ => Self::Natural,
        }
    }

    /// The persona block for this style.
    #[must_use]
    pub fn persona(self) -> &'static str {
        match self {
            Self::Natural => PERSONA_NATURAL,
            Self::Conversational => PERSONA_CONVERSATIONAL,
            Self::Formal => PERSONA_FORMAL,
            Self::Enthusiastic => PERSONA_ENTHUSIASTIC,
            Self::Breathy => PERSONA_BREATHY,
            Self::Dramatic => PERSONA_DRAMATIC,
        }
    }
}

impl fmt::Display for VoiceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for VoiceStyle {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<VoiceStyle> for String {
    fn from(style: VoiceStyle) -> Self {
        style.as_str().to_owned()
    }
}

/// Pace clause for the given speech rate.
///
/// Anything that is neither below nor above `1.0` (including NaN) reads as
/// natural pace.
#[must_use]
pub fn pace_clause(speed: f64) -> String {
    if speed < 1.0 {
        let speed = format_rate(speed);
        format!("PACE: Slower than normal ({speed}x). Enunciate clearly and take your time.")
    } else if speed > 1.0 {
        let speed = format_rate(speed);
        format!("PACE: Faster than normal ({speed}x). Speak quickly and efficiently.")
    } else {
        NATURAL_PACE.to_owned()
    }
}

/// Shortest text for a rate, spelled the way browsers print numbers.
///
/// Magnitudes in `[1e-6, 1e21)` print as plain decimals and everything else
/// in exponent form (`1e-7`, `1e+21`). Both zeros print as `0`.
fn format_rate(rate: f64) -> String {
    if rate.is_infinite() {
        return if rate > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if rate == 0.0 {
        return "0".to_owned();
    }
    let magnitude = rate.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return rate.to_string();
    }
    let exponent_form = format!("{rate:e}");
    match exponent_form.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exponent_form,
    }
}

/// Build the full interpreter system prompt.
///
/// `language` is quoted verbatim in the objective. An empty language only
/// affects the `Target Language` header, which falls back to
/// [`TAGLISH_LOCALE`]. The text opens and ends with a newline, and the persona
/// block is set off by a blank line on each side plus its own line breaks.
#[must_use]
pub fn build_prompt(language: &str, speed: f64, style: VoiceStyle) -> String {
    let header_language = if language.is_empty() {
        TAGLISH_LOCALE
    } else {
        language
    };
    let pace = pace_clause(speed);
    let persona = style.persona();

    format!(
        "\n\
         SYSTEM MODE: STRICT TEXT-TO-SPEECH (TTS) ENGINE.\n\
         Role: You are an Elite Simultaneous Interpreter & Voice Actor.\n\
         Target Language: [{header_language}]\n\
         {pace}\n\
         \n\
         {AUDIO_TAG_PROTOCOL}\n\
         \n\
         {NON_CONVERSATIONAL_PROTOCOL}\n\
         \n\
         OBJECTIVE:\n\
         Translate the incoming text segments into [{language}] immediately and speak them.\n\
         \n\
         {PRONUNCIATION_PROTOCOL}\n\
         \n\
         \n\
         {persona}\n\
         \n\
         \n\
         {CLOSING_DIRECTIVE}\n"
    )
}
