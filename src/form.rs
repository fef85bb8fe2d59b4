// 📝 Form validation - single person entry (name, CPF, date of birth)
//
// Field rules:
// - name: required, >= 3 characters, letters and spaces only
// - CPF: required, must pass the checksum
// - date of birth: required, DD/MM/YYYY, real date, age 18..=120

use crate::checksum::validate;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 120;

static NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ\s]+$").expect("valid regex"));

static BIRTH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    pub name: String,
    pub id_number: String,
    pub date_of_birth: String,
}

/// Message per failing field, `None` when the field is fine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValidation {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

/// Validate a form as of `today`
pub fn validate_form(form: &FormData, today: NaiveDate) -> FormValidation {
    let errors = FieldErrors {
        name: check_name(&form.name),
        id_number: check_id_number(&form.id_number),
        date_of_birth: check_date_of_birth(&form.date_of_birth, today),
    };

    FormValidation {
        is_valid: errors.name.is_none()
            && errors.id_number.is_none()
            && errors.date_of_birth.is_none(),
        errors,
    }
}

fn check_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.chars().count() < 3 {
        return Some("Nome deve ter no mínimo 3 caracteres".to_string());
    }
    if !NAME_CHARS.is_match(name) {
        return Some("Nome deve conter apenas letras e espaços".to_string());
    }
    None
}

fn check_id_number(id_number: &str) -> Option<String> {
    if id_number.trim().is_empty() {
        return Some("CPF é obrigatório".to_string());
    }
    if !validate(id_number) {
        return Some("CPF inválido".to_string());
    }
    None
}

fn check_date_of_birth(raw: &str, today: NaiveDate) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some("Data de nascimento é obrigatória".to_string());
    }

    let Some(caps) = BIRTH_DATE.captures(raw) else {
        return Some("Data deve estar no formato DD/MM/AAAA".to_string());
    };

    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let birth = match (part(1), part(2), part(3)) {
        (Some(day), Some(month), Some(year)) => {
            NaiveDate::from_ymd_opt(year as i32, month, day)
        }
        _ => None,
    };
    let Some(birth) = birth else {
        return Some("Data inválida".to_string());
    };

    let age = age_on(birth, today);
    if age < MIN_AGE {
        return Some("Idade mínima de 18 anos".to_string());
    }
    if age > MAX_AGE {
        return Some("Data de nascimento inválida".to_string());
    }
    None
}

/// Completed years between `birth` and `today`
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
