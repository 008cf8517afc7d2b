use std::fmt;

use serde::{Deserialize, Serialize};

/// The forms this service accepts submissions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FormVariant {
    General,
    CampusAmbassador,
    Demo,
}

/// Field layout of one variant.
pub struct VariantSchema {
    /// Raw key holding the submitter's name.
    pub name_key: &'static str,
    /// Raw keys renamed when moved into the nested `form_data` payload.
    pub renames: &'static [(&'static str, &'static str)],
    pub title: &'static str,
    pub description: &'static str,
    /// Column order of the spreadsheet tab for this variant.
    pub sheet_headers: &'static [&'static str],
}

/// Raw keys shared by every variant, stored in fixed columns.
pub const EMAIL_KEY: &str = "email";
pub const PHONE_KEY: &str = "whatsapp";
pub const FORM_TYPE_KEY: &str = "form_type";

const REGISTRATION_HEADERS: &[&str] = &[
    "timestamp",
    "first_name",
    "email",
    "whatsapp",
    "preference",
    "occupation",
    "form_type",
    "recommendation",
    "income",
    "frontend_interest",
    "form_data",
];

const GENERAL: VariantSchema = VariantSchema {
    name_key: "firstName",
    renames: &[("frontendInterest", "frontend_interest")],
    title: "General Registration",
    description: "General registration form submissions",
    sheet_headers: REGISTRATION_HEADERS,
};

const CAMPUS_AMBASSADOR: VariantSchema = VariantSchema {
    name_key: "fullName",
    renames: &[("yearOfStudy", "year_of_study")],
    title: "Campus Ambassador",
    description: "Form for campus ambassador registrations",
    sheet_headers: &[
        "timestamp",
        "full_name",
        "email",
        "whatsapp",
        "college",
        "year_of_study",
        "motivation",
        "strategy",
        "form_type",
    ],
};

const DEMO: VariantSchema = VariantSchema {
    name_key: "firstName",
    renames: &[("frontendInterest", "frontend_interest")],
    title: "Demo Form",
    description: "Demo registration form submissions",
    sheet_headers: REGISTRATION_HEADERS,
};

impl FormVariant {
    pub const ALL: [FormVariant; 3] = [
        FormVariant::General,
        FormVariant::CampusAmbassador,
        FormVariant::Demo,
    ];

    pub fn id(self) -> &'static str {
        match self {
            FormVariant::General => "general",
            FormVariant::CampusAmbassador => "campus-ambassador",
            FormVariant::Demo => "demo",
        }
    }

    pub fn schema(self) -> &'static VariantSchema {
        match self {
            FormVariant::General => &GENERAL,
            FormVariant::CampusAmbassador => &CAMPUS_AMBASSADOR,
            FormVariant::Demo => &DEMO,
        }
    }

    /// Parse a wire identifier. Accepts the older form slugs as aliases.
    pub fn parse(raw: &str) -> Option<FormVariant> {
        match raw.trim() {
            "general" | "formx1" | "formx4" => Some(FormVariant::General),
            "campus-ambassador" => Some(FormVariant::CampusAmbassador),
            "demo" | "demo-form" => Some(FormVariant::Demo),
            _ => None,
        }
    }

    /// Key under which a variant-specific raw field is stored in `form_data`.
    pub fn nested_key(self, raw_key: &str) -> String {
        self.schema()
            .renames
            .iter()
            .find(|(from, _)| *from == raw_key)
            .map(|(_, to)| to.to_string())
            .unwrap_or_else(|| raw_key.to_string())
    }

    /// Whether a raw key belongs in one of the fixed columns.
    pub fn is_common_key(self, raw_key: &str) -> bool {
        raw_key == EMAIL_KEY
            || raw_key == PHONE_KEY
            || raw_key == FORM_TYPE_KEY
            || raw_key == self.schema().name_key
    }
}

impl fmt::Display for FormVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl TryFrom<String> for FormVariant {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FormVariant::parse(&value).ok_or_else(|| format!("Unknown form type: {value}"))
    }
}

impl From<FormVariant> for String {
    fn from(v: FormVariant) -> Self {
        v.id().to_string()
    }
}
