use cfr_error::Result;

use crate::node::{EnumValue, FormView, NumericOption, TextOption};

/// Callbacks driven by the walker, in pre-order.
///
/// Every method defaults to a no-op. Returning an error from a callback
/// rejects that record: the walker logs it, records a diagnostic and moves
/// on to the next sibling. An error from [`Visitor::on_form_enter`] skips
/// the form's children and its `on_form_exit`.
pub trait Visitor<'a> {
    fn on_form_enter(&mut self, _form: &FormView<'a>) -> Result<()> {
        Ok(())
    }

    fn on_form_exit(&mut self, _form: &FormView<'a>) -> Result<()> {
        Ok(())
    }

    /// Called once per enum value, in declaration order, before the owning
    /// option's [`Visitor::on_numeric_option`].
    fn on_enum_value(&mut self, _option: &NumericOption<'a>, _value: &EnumValue<'a>) -> Result<()> {
        Ok(())
    }

    fn on_numeric_option(&mut self, _option: &NumericOption<'a>) -> Result<()> {
        Ok(())
    }

    fn on_text_option(&mut self, _option: &TextOption<'a>) -> Result<()> {
        Ok(())
    }
}
