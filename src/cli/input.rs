use crossterm::event::KeyCode;

/// Single-line text field used by forms and prompts. The cursor counts chars.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct LineEdit {
    pub value: String,
    pub cursor: usize,
}

impl LineEdit {
    pub fn with_value(s: impl Into<String>) -> Self {
        let mut edit = Self::default();
        edit.set(s);
        edit
    }

    pub fn set(&mut self, s: impl Into<String>) {
        self.value = s.into();
        self.cursor = self.value.chars().count();
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn push(&mut self, ch: char) {
        let at = self.byte_index();
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    /// Applies an editing key. Returns false for keys it does not handle.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char(c) => self.push(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.chars().count(),
            _ => return false,
        }
        true
    }

    /// Value with a block cursor, for the focused field.
    pub fn rendered(&self, focused: bool) -> String {
        if !focused {
            return self.value.clone();
        }
        let at = self.byte_index();
        format!("{}|{}", &self.value[..at], &self.value[at..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_the_cursor() {
        let mut e = LineEdit::with_value("caf");
        e.push('é');
        e.left();
        e.left();
        e.push('x');
        assert_eq!(e.value, "caxfé");
        e.backspace();
        e.delete();
        assert_eq!(e.value, "caé");
        assert_eq!(e.rendered(true), "ca|é");
    }

    #[test]
    fn handle_key_reports_unhandled_keys() {
        let mut e = LineEdit::default();
        assert!(e.handle_key(KeyCode::Char('7')));
        assert!(!e.handle_key(KeyCode::Enter));
        assert_eq!(e.trimmed(), "7");
    }
}
