//! M-Pesa collection settings for drivers.
//!
//! A driver collects fares through exactly one of three modes:
//! a Buy Goods till, a Paybill with an account number, or Send Money to a
//! phone number.

use serde::{Deserialize, Serialize};

use crate::contact::normalize_phone;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Till,
    Paybill,
    SendMoney,
}

/// Raw settings form as submitted. Fields that do not apply to the chosen
/// type are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MpesaForm {
    pub payment_type: Option<PaymentType>,
    #[serde(default)]
    pub till_number: String,
    #[serde(default)]
    pub paybill_number: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub account_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "payment_type", rename_all = "snake_case")]
pub enum MpesaDetails {
    Till {
        till_number: String,
        account_name: Option<String>,
    },
    Paybill {
        paybill_number: String,
        account_number: String,
        account_name: Option<String>,
    },
    SendMoney {
        phone_number: String,
        account_name: Option<String>,
    },
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

fn digits(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.chars().all(|c| c.is_ascii_digit()) && (5..=10).contains(&value.len()) {
        Ok(value.to_string())
    } else {
        Err(AppError::BadRequest(format!("{field} must be 5 to 10 digits")))
    }
}

impl MpesaForm {
    /// Whether the submit action is enabled for the selected type.
    pub fn can_submit(&self) -> bool {
        match self.payment_type {
            None => false,
            Some(PaymentType::Till) => filled(&self.till_number),
            Some(PaymentType::Paybill) => {
                filled(&self.paybill_number) && filled(&self.account_number)
            }
            Some(PaymentType::SendMoney) => filled(&self.phone_number),
        }
    }

    pub fn validate(&self) -> Result<MpesaDetails, AppError> {
        if !self.can_submit() {
            return Err(AppError::BadRequest("required payment fields are missing".to_string()));
        }

        let account_name = filled(&self.account_name).then(|| self.account_name.trim().to_string());

        match self.payment_type {
            Some(PaymentType::Till) => Ok(MpesaDetails::Till {
                till_number: digits("till_number", &self.till_number)?,
                account_name,
            }),
            Some(PaymentType::Paybill) => Ok(MpesaDetails::Paybill {
                paybill_number: digits("paybill_number", &self.paybill_number)?,
                account_number: self.account_number.trim().to_string(),
                account_name,
            }),
            Some(PaymentType::SendMoney) => {
                let phone_number = normalize_phone(&self.phone_number).ok_or_else(|| {
                    AppError::BadRequest("phone_number is not a valid phone number".to_string())
                })?;
                Ok(MpesaDetails::SendMoney {
                    phone_number,
                    account_name,
                })
            }
            None => Err(AppError::BadRequest("payment_type is required".to_string())),
        }
    }
}

impl MpesaDetails {
    /// Step-by-step instructions shown to the customer.
    pub fn instructions(&self, amount: Option<f64>) -> Vec<String> {
        let mut steps = vec!["Go to the M-PESA menu on your phone".to_string()];

        match self {
            MpesaDetails::Till { till_number, .. } => {
                steps.push("Select Lipa na M-PESA".to_string());
                steps.push("Select Buy Goods and Services".to_string());
                steps.push(format!("Enter Till Number {till_number}"));
            }
            MpesaDetails::Paybill {
                paybill_number,
                account_number,
                ..
            } => {
                steps.push("Select Lipa na M-PESA".to_string());
                steps.push("Select Pay Bill".to_string());
                steps.push(format!("Enter Business Number {paybill_number}"));
                steps.push(format!("Enter Account Number {account_number}"));
            }
            MpesaDetails::SendMoney { phone_number, .. } => {
                steps.push("Select Send Money".to_string());
                steps.push(format!("Enter phone number +{phone_number}"));
            }
        }

        match amount {
            Some(amount) => steps.push(format!("Enter amount KES {amount:.0}")),
            None => steps.push("Enter the fare agreed with your driver".to_string()),
        }
        steps.push("Enter your M-PESA PIN and confirm".to_string());

        if let Some(name) = self.account_name() {
            steps.push(format!("Confirm the recipient name is {name}"));
        }

        steps
    }

    fn account_name(&self) -> Option<&str> {
        match self {
            MpesaDetails::Till { account_name, .. }
            | MpesaDetails::Paybill { account_name, .. }
            | MpesaDetails::SendMoney { account_name, .. } => account_name.as_deref(),
        }
    }
}
