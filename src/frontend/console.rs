//! 终端交互
//!
//! 逐行读取受访者输入，负责同意流程、作答、人口统计与确认提示

use phf::{phf_map, phf_set};
use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::error::ConsentError;
use crate::models::Choice;
use crate::workflow::{ConsentForm, Status, StatusKind};

/// 作答输入 → 选项
static CHOICE_KEYS: phf::Map<&'static str, Choice> = phf_map! {
    "a" => Choice::A,
    "1" => Choice::A,
    "b" => Choice::B,
    "2" => Choice::B,
    "u" => Choice::Undecided,
    "?" => Choice::Undecided,
};

static YES_KEYS: phf::Set<&'static str> = phf_set! {
    "y",
    "yes",
};

/// 解析作答输入，未启用"无法决定"时拒绝 `u` / `?`
pub fn parse_choice(input: &str, allow_undecided: bool) -> Option<Choice> {
    let key = input.trim().to_ascii_lowercase();
    match CHOICE_KEYS.get(key.as_str()).copied() {
        Some(Choice::Undecided) if !allow_undecided => None,
        other => other,
    }
}

pub fn is_yes(input: &str) -> bool {
    YES_KEYS.contains(input.trim().to_ascii_lowercase().as_str())
}

/// 终端会话
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// 输出提示并读取一行，输入结束时返回 `None`
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.writer, "{}", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// 阻塞直到受访者勾选同意并填写口令
    ///
    /// # 返回
    /// 去除空白后的口令
    pub fn require_consent_and_token(&mut self) -> Result<String, ConsentError> {
        self.consent_loop().map_err(|e| {
            warn!("读取同意输入失败: {}", e);
            ConsentError::InputClosed
        })?
    }

    fn consent_loop(&mut self) -> io::Result<Result<String, ConsentError>> {
        writeln!(self.writer, "=== Consent ===")?;
        writeln!(
            self.writer,
            "Participation is voluntary. Your choices are recorded anonymously."
        )?;

        let mut form = ConsentForm::new();
        loop {
            let Some(answer) = self.read_line("I consent to take part [y/N]: ")? else {
                return Ok(Err(ConsentError::InputClosed));
            };
            form.consented = is_yes(&answer);

            let Some(secret) = self.read_line("Secret token: ")? else {
                return Ok(Err(ConsentError::InputClosed));
            };
            form.secret = secret;

            match form.try_continue() {
                Ok(token) => return Ok(Ok(token)),
                Err(e) => writeln!(self.writer, "{}", e)?,
            }
        }
    }

    /// 读取第 `index` 题的选择，输入非法时重复询问
    pub fn prompt_choice(
        &mut self,
        index: usize,
        allow_undecided: bool,
    ) -> io::Result<Option<Choice>> {
        let prompt = if allow_undecided {
            format!("Question {} - choose A, B or U (can't decide): ", index)
        } else {
            format!("Question {} - choose A or B: ", index)
        };

        loop {
            let Some(input) = self.read_line(&prompt)? else {
                return Ok(None);
            };
            match parse_choice(&input, allow_undecided) {
                Some(choice) => return Ok(Some(choice)),
                None => writeln!(self.writer, "Please enter a valid choice.")?,
            }
        }
    }

    /// 从编号列表中选择一项
    pub fn prompt_option(&mut self, label: &str, options: &[String]) -> io::Result<Option<String>> {
        writeln!(self.writer, "{}", label)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.writer, "  {}) {}", i + 1, option)?;
        }

        loop {
            let Some(input) = self.read_line("> ")? else {
                return Ok(None);
            };
            let picked = input
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .or_else(|| options.iter().find(|o| o.as_str() == input.trim()));

            match picked {
                Some(option) => return Ok(Some(option.clone())),
                None => writeln!(self.writer, "Please pick one of the listed options.")?,
            }
        }
    }

    /// 是/否确认，输入结束视为否
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self.read_line(prompt)?.map(|a| is_yes(&a)).unwrap_or(false))
    }

    pub fn show_status(&mut self, status: &Status) -> io::Result<()> {
        let marker = match status.kind {
            StatusKind::Plain => "",
            StatusKind::Muted => "· ",
            StatusKind::Ok => "✓ ",
            StatusKind::Err => "✗ ",
        };
        writeln!(self.writer, "{}{}", marker, status.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(console: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(console.into_writer()).unwrap()
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice(" A ", false), Some(Choice::A));
        assert_eq!(parse_choice("2", false), Some(Choice::B));
        assert_eq!(parse_choice("u", false), None);
        assert_eq!(parse_choice("u", true), Some(Choice::Undecided));
        assert_eq!(parse_choice("c", true), None);
    }

    #[test]
    fn test_consent_repeats_until_both_given() {
        let mut c = console("n\ntok\ny\n   \nYES\n  tok-1 \n");
        assert_eq!(c.require_consent_and_token().as_deref(), Ok("tok-1"));

        let out = output(c);
        assert!(out.contains("You must consent to continue."));
        assert!(out.contains("Please enter the secret token."));
    }

    #[test]
    fn test_consent_input_closed() {
        let mut c = console("y\n");
        assert_eq!(c.require_consent_and_token(), Err(ConsentError::InputClosed));
    }

    #[test]
    fn test_prompt_choice_retries_invalid_input() {
        let mut c = console("x\nb\n");
        assert_eq!(c.prompt_choice(1, false).unwrap(), Some(Choice::B));
        assert!(output(c).contains("Please enter a valid choice."));
    }

    #[test]
    fn test_prompt_option_by_number_or_value() {
        let options = vec!["18-24".to_string(), "25-34".to_string()];
        let mut c = console("9\n2\n18-24\n");
        assert_eq!(c.prompt_option("Age", &options).unwrap().as_deref(), Some("25-34"));
        assert_eq!(c.prompt_option("Age", &options).unwrap().as_deref(), Some("18-24"));
        assert_eq!(c.prompt_option("Age", &options).unwrap(), None);
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut c = console("y\nnope\n");
        assert!(c.confirm("? ").unwrap());
        assert!(!c.confirm("? ").unwrap());
        assert!(!c.confirm("? ").unwrap());
    }
}
