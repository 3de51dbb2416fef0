//! Prompt composition for chat and translation requests.
//!
//! Prompt text lives in named MiniJinja templates rather than inline string
//! concatenation, so the instruction payload can be audited and localized
//! without touching the composition logic.

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorDetails};

const PERSONA_TEMPLATE: &str = "\
You are AI Mutawwif ElysianGo — a multilingual guidance companion for Umrah and Hajj.
Provide clear, compassionate, balanced guidance with a short relevant dua at the end of each answer.
Avoid medical or legal topics; advise user to follow local scholars and official regulations if unsure.
Always stay within Sunni mainstream understanding and respect different madhhab opinions.";

const MODE_BASIC_TEMPLATE: &str = "\
Mode: BASIC.
Keep answers short and practical (max 3 short paragraphs).
Avoid deep fiqh debates. If a question is complex, briefly explain and kindly suggest upgrading to Mutawwif Pro
for detailed madhhab comparisons, multi-step guidance, and advanced scenarios.";

const MODE_PRO_TEMPLATE: &str = "\
Mode: PRO.
Provide deep explanations, mention different scholarly views when relevant,
give step-by-step rituals, practical preparation tips, crowd navigation, adab and duas.
Structure answers clearly with headings or bullet points when helpful.";

const LANGUAGE_BASIC_TEMPLATE: &str = "\
Primary language: {{ language_name }}.
You MUST respond ONLY in {{ language_name }}. If the user uses another language,
kindly switch to {{ language_name }} but keep Arabic for Qur'an and duas when needed.";

const LANGUAGE_PRO_TEMPLATE: &str = "\
Primary language: {{ language_name }}.
You MUST respond ONLY in {{ language_name }}. Preserve Arabic for Qur'an verses and duas.
Mention practical, context-aware tips for modern pilgrims.";

const SUBSCRIBER_TEMPLATE: &str = "\
User email: {{ email }}. Treat them as a valued Pro subscriber and keep tone respectful, concise, and expert.";

const TRANSLATE_TEMPLATE: &str = "\
You are a precise translation assistant for ElysianGo Mutawwif.
Translate the user's text into {{ language_name }}.
Keep dua and Qur'an in Arabic but may optionally add translation after.
Return ONLY the translated text, no explanations, no quotes.";

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_SYSTEM.to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTier {
    Basic,
    Pro,
}

impl ChatTier {
    pub fn mode(&self) -> &'static str {
        match self {
            ChatTier::Basic => "basic",
            ChatTier::Pro => "pro",
        }
    }
}

pub struct PromptComposer {
    env: Environment<'static>,
}

impl PromptComposer {
    pub fn new() -> Result<Self, Error> {
        let mut env = Environment::new();
        for (name, source) in [
            ("persona", PERSONA_TEMPLATE),
            ("mode_basic", MODE_BASIC_TEMPLATE),
            ("mode_pro", MODE_PRO_TEMPLATE),
            ("language_basic", LANGUAGE_BASIC_TEMPLATE),
            ("language_pro", LANGUAGE_PRO_TEMPLATE),
            ("subscriber", SUBSCRIBER_TEMPLATE),
            ("translate", TRANSLATE_TEMPLATE),
        ] {
            env.add_template(name, source).map_err(|e| {
                Error::new(ErrorDetails::PromptTemplate {
                    message: format!("Failed to register template `{name}`: {e}"),
                })
            })?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, Error> {
        let template = self.env.get_template(name).map_err(|e| {
            Error::new(ErrorDetails::PromptTemplate {
                message: format!("Missing template `{name}`: {e}"),
            })
        })?;
        template.render(ctx).map_err(|e| {
            Error::new(ErrorDetails::PromptTemplate {
                message: format!("Failed to render template `{name}`: {e}"),
            })
        })
    }

    /// Build the ordered message list for a chat request.
    ///
    /// The system directive comes first, followed (Pro only) by the subscriber
    /// directive, then the trailing `history_window` entries of the supplied
    /// history in their original order, and the new user message last.
    pub fn compose_chat(
        &self,
        tier: ChatTier,
        language_name: &str,
        history: &[ChatMessage],
        message: &str,
        subscriber_email: Option<&str>,
        history_window: usize,
    ) -> Result<Vec<ChatMessage>, Error> {
        let (mode_template, language_template) = match tier {
            ChatTier::Basic => ("mode_basic", "language_basic"),
            ChatTier::Pro => ("mode_pro", "language_pro"),
        };

        let persona = self.render("persona", context! {})?;
        let mode = self.render(mode_template, context! {})?;
        let language = self.render(language_template, context! { language_name })?;

        let mut messages = Vec::with_capacity(history.len().min(history_window) + 3);
        messages.push(ChatMessage::system(format!("{persona}\n{mode}\n{language}")));

        if tier == ChatTier::Pro {
            if let Some(email) = subscriber_email {
                let directive = self.render("subscriber", context! { email })?;
                messages.push(ChatMessage::system(directive));
            }
        }

        let window_start = history.len().saturating_sub(history_window);
        messages.extend_from_slice(&history[window_start..]);
        messages.push(ChatMessage::user(message));
        Ok(messages)
    }

    /// Build the message list for a translation request.
    pub fn compose_translate(
        &self,
        language_name: &str,
        text: &str,
    ) -> Result<Vec<ChatMessage>, Error> {
        let directive = self.render("translate", context! { language_name })?;
        Ok(vec![
            ChatMessage::system(directive),
            ChatMessage::user(text),
        ])
    }
}
