//! Inline keyboard for picking a voice, and the callback data it carries.

use crate::telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::tts::Voice;

pub const PAGE_SIZE: usize = 8;

const BACK_LABEL: &str = "⟵ Back";
const NEXT_LABEL: &str = "Next ⟶";
const REFRESH_LABEL: &str = "Refresh";

/// What a picker button asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Pick(String),
    Page(usize),
    Refresh,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if data == "refresh" {
            return Some(Self::Refresh);
        }
        if let Some(voice_id) = data.strip_prefix("pick:") {
            if voice_id.is_empty() {
                return None;
            }
            return Some(Self::Pick(voice_id.to_string()));
        }
        if let Some(page) = data.strip_prefix("page:") {
            return page.parse().ok().map(Self::Page);
        }
        None
    }

    pub fn to_data(&self) -> String {
        match self {
            Self::Pick(voice_id) => format!("pick:{voice_id}"),
            Self::Page(page) => format!("page:{page}"),
            Self::Refresh => "refresh".to_string(),
        }
    }
}

/// Number of pages needed for `count` voices; never less than one
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// One button per voice on `page`, then a navigation row. Pages past the
/// end show the last page.
pub fn voice_keyboard(voices: &[Voice], page: usize) -> InlineKeyboardMarkup {
    let pages = total_pages(voices.len());
    let page = page.min(pages - 1);

    let mut rows: Vec<Vec<InlineKeyboardButton>> = voices
        .iter()
        .skip(page * PAGE_SIZE)
        .take(PAGE_SIZE)
        .map(|voice| {
            vec![InlineKeyboardButton::callback(
                voice.label(),
                CallbackAction::Pick(voice.id.clone()).to_data(),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(InlineKeyboardButton::callback(
            BACK_LABEL,
            CallbackAction::Page(page - 1).to_data(),
        ));
    }
    if page + 1 < pages {
        nav.push(InlineKeyboardButton::callback(
            NEXT_LABEL,
            CallbackAction::Page(page + 1).to_data(),
        ));
    }
    nav.push(InlineKeyboardButton::callback(
        REFRESH_LABEL,
        CallbackAction::Refresh.to_data(),
    ));
    rows.push(nav);

    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn voices(count: usize) -> Vec<Voice> {
        (0..count)
            .map(|i| Voice::new(format!("v{i}"), format!("Voice {i}")))
            .collect()
    }

    fn nav_labels(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
        keyboard
            .inline_keyboard
            .last()
            .unwrap()
            .iter()
            .map(|b| b.text.clone())
            .collect()
    }

    #[rstest]
    #[case("pick:abc", Some(CallbackAction::Pick("abc".to_string())))]
    #[case("pick:a:b", Some(CallbackAction::Pick("a:b".to_string())))]
    #[case("page:2", Some(CallbackAction::Page(2)))]
    #[case("refresh", Some(CallbackAction::Refresh))]
    #[case("page:x", None)]
    #[case("page:-1", None)]
    #[case("pick:", None)]
    #[case("other", None)]
    fn test_parse_callback(#[case] data: &str, #[case] expected: Option<CallbackAction>) {
        assert_eq!(CallbackAction::parse(data), expected);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(8, 1)]
    #[case(9, 2)]
    #[case(17, 3)]
    fn test_total_pages(#[case] count: usize, #[case] expected: usize) {
        assert_eq!(total_pages(count), expected);
    }

    #[test]
    fn test_single_page_has_only_refresh() {
        let keyboard = voice_keyboard(&voices(3), 0);

        assert_eq!(keyboard.inline_keyboard.len(), 4);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "Voice 0");
        assert_eq!(keyboard.inline_keyboard[0][0].callback_data, "pick:v0");
        assert_eq!(nav_labels(&keyboard), vec![REFRESH_LABEL]);
    }

    #[test]
    fn test_middle_page_navigates_both_ways() {
        let keyboard = voice_keyboard(&voices(20), 1);

        assert_eq!(keyboard.inline_keyboard.len(), PAGE_SIZE + 1);
        assert_eq!(keyboard.inline_keyboard[0][0].callback_data, "pick:v8");
        assert_eq!(
            nav_labels(&keyboard),
            vec![BACK_LABEL, NEXT_LABEL, REFRESH_LABEL]
        );
        let nav = keyboard.inline_keyboard.last().unwrap();
        assert_eq!(nav[0].callback_data, "page:0");
        assert_eq!(nav[1].callback_data, "page:2");
    }

    #[test]
    fn test_page_past_end_is_clamped() {
        let keyboard = voice_keyboard(&voices(10), 7);

        // Last page holds the remaining two voices
        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert_eq!(keyboard.inline_keyboard[0][0].callback_data, "pick:v8");
        assert_eq!(nav_labels(&keyboard), vec![BACK_LABEL, REFRESH_LABEL]);
    }

    #[test]
    fn test_nameless_voice_shows_id() {
        let keyboard = voice_keyboard(&[Voice::new("abc", "")], 0);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "abc");
    }
}
