//! 知情同意表单
//!
//! "继续"只有在勾选同意且填写了非空口令时才可用

use crate::error::ConsentError;

/// 同意表单的输入状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentForm {
    pub consented: bool,
    pub secret: String,
}

impl ConsentForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// "继续"是否可用
    pub fn can_continue(&self) -> bool {
        self.consented && !self.secret.trim().is_empty()
    }

    /// 尝试继续，成功时返回去除空白后的口令
    pub fn try_continue(&self) -> Result<String, ConsentError> {
        if !self.consented {
            return Err(ConsentError::NotConsented);
        }
        let token = self.secret.trim();
        if token.is_empty() {
            return Err(ConsentError::MissingToken);
        }
        Ok(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_conditions_required() {
        let mut form = ConsentForm::new();
        assert!(!form.can_continue());

        form.secret = "tok".into();
        assert!(!form.can_continue());
        assert_eq!(form.try_continue(), Err(ConsentError::NotConsented));

        form.consented = true;
        form.secret = "   ".into();
        assert!(!form.can_continue());
        assert_eq!(form.try_continue(), Err(ConsentError::MissingToken));

        form.secret = " tok ".into();
        assert!(form.can_continue());
        assert_eq!(form.try_continue().as_deref(), Ok("tok"));
    }

    #[test]
    fn test_messages_match_modal_text() {
        assert_eq!(ConsentError::NotConsented.to_string(), "You must consent to continue.");
        assert_eq!(ConsentError::MissingToken.to_string(), "Please enter the secret token.");
    }
}
