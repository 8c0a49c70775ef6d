// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Prompt set for on-device generation.
//!
//! Each builder returns the prompt text plus the [`CompletionOptions`] it
//! should run with. Temperatures are derived from the user's setting.

use std::time::Duration;

use super::{CompletionOptions, GenerationRequest};

pub const BASE_SYSTEM_PROMPT: &str = "You are Lectern, an award-winning pedagogy expert running fully on-device.\n\
Provide academically rigorous yet accessible explanations tailored to self-directed learners.\n\
Ground every output strictly in the supplied transcript without inventing facts.\n\
Keep tone encouraging and never mention that you are an AI model.";

pub const LANGUAGE_SYSTEM_PROMPT: &str =
    "You are a linguistic expert. Reply with nothing except the language name.";

/// Characters of transcript sent to the language prompt.
pub const LANGUAGE_EXCERPT_CHARS: usize = 2000;

pub const LANGUAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-prompt timeouts that are not fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTimeouts {
    pub completion: Duration,
    pub study_plan: Duration,
}

impl Default for PromptTimeouts {
    fn default() -> Self {
        Self {
            completion: Duration::from_secs(45),
            study_plan: Duration::from_secs(30),
        }
    }
}

/// A prompt ready to send.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub options: CompletionOptions,
}

pub(crate) fn request_header(request: &GenerationRequest) -> String {
    let title = if request.title.trim().is_empty() {
        "Untitled"
    } else {
        request.title.trim()
    };
    format!(
        "Video title: {}\nVideo URL: {}\nNumber of MCQs: {}\nTarget difficulty: {}",
        title, request.source_url, request.settings.num_questions, request.settings.difficulty
    )
}

fn options(request: &GenerationRequest, system: String, temperature: f32, timeout: Duration) -> CompletionOptions {
    CompletionOptions {
        system_prompt: Some(system),
        temperature,
        timeout,
        preferred_model: request
            .settings
            .strategy_preference
            .preferred_name()
            .map(str::to_string),
        ..Default::default()
    }
}

pub fn language_prompt(request: &GenerationRequest) -> Prompt {
    let text = format!(
        "Identify the primary human language used in the following text.\n\
         Respond with the language name only (e.g., English, Hindi, Spanish).\n\n{}",
        request.transcript.excerpt(LANGUAGE_EXCERPT_CHARS)
    );
    Prompt {
        text,
        options: options(request, LANGUAGE_SYSTEM_PROMPT.to_string(), 0.1, LANGUAGE_TIMEOUT),
    }
}

pub fn notes_prompt(request: &GenerationRequest, timeouts: PromptTimeouts) -> Prompt {
    let text = format!(
        "{}\n\
         Task: Craft structured MARKDOWN study notes grounded in the transcript.\n\
         Requirements:\n\
         - Organize content with H2/H3 headings and short paragraphs.\n\
         - Include prioritized bullet lists and key formulas if present.\n\
         - Highlight actionable insights and learner takeaways.\n\
         - Keep within 320 words.\n\n\
         Transcript:\n{}",
        request.header(),
        request.transcript.text()
    );
    let temperature = (request.settings.temperature + 0.15).min(0.85);
    Prompt {
        text,
        options: options(
            request,
            format!("{}\nAlways return only markdown content.", BASE_SYSTEM_PROMPT),
            temperature,
            timeouts.completion,
        ),
    }
}

pub fn quiz_prompt(request: &GenerationRequest, timeouts: PromptTimeouts) -> Prompt {
    let text = format!(
        "{}\n\
         Create {} multiple-choice questions (MCQs) that reinforce understanding.\n\
         Output strictly as JSON array with this shape:\n\
         [{{\"question\":\"...\",\"options\":[\"A\",\"B\",\"C\",\"D\"],\"correct_index\":1,\"explanation\":\"...\"}}]\n\
         Guidelines:\n\
         - Vary cognitive level (recall, application, synthesis).\n\
         - Ensure each question references transcript facts.\n\
         - Options must be concise and mutually exclusive.\n\
         - Explanation must justify the correct answer in 1 sentence.\n\n\
         Transcript excerpt:\n{}",
        request.header(),
        request.settings.num_questions,
        request.transcript.text()
    );
    let temperature = request.settings.temperature.max(0.45);
    Prompt {
        text,
        options: options(
            request,
            format!("{}\nAlways respond with valid JSON only.", BASE_SYSTEM_PROMPT),
            temperature,
            timeouts.completion,
        ),
    }
}

pub fn study_plan_prompt(request: &GenerationRequest, timeouts: PromptTimeouts) -> Prompt {
    let text = format!(
        "{}\n\
         Compose a personalized study coach plan using markdown headings exactly as follows:\n\
         ## Quick Diagnostic\n\
         ## Priority Topics\n\
         ## Practice Actions\n\
         ## Reflection Prompts\n\
         Instructions:\n\
         - Keep each section concise and grounded in the transcript facts.\n\
         - Quick Diagnostic: 2 bullet insights about learner understanding.\n\
         - Priority Topics: bullet list of key concepts to reinforce.\n\
         - Practice Actions: 3 actionable tasks referencing transcript ideas.\n\
         - Reflection Prompts: 2 questions that encourage metacognition.\n\
         - Keep the entire response under 220 words.\n\n\
         Transcript basis:\n{}",
        request.header(),
        request.transcript.text()
    );
    let temperature = (request.settings.temperature - 0.05).max(0.4);
    Prompt {
        text,
        options: options(
            request,
            format!("{}\nReturn markdown with the required headings only.", BASE_SYSTEM_PROMPT),
            temperature,
            timeouts.study_plan,
        ),
    }
}
