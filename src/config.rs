// config.rs
// Immutable application configuration read once from the environment (.env honored).

use std::{env, path::PathBuf};

use crate::calendar::MonthNames;

/// Which prior months flow into the amount owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccrualMode {
    /// Reference month plus every unresolved earlier month of the year.
    #[default]
    Cumulative,
    /// Reference month only.
    ReferenceOnly,
}

impl AccrualMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "cumulative" | "cumulativo" => Some(AccrualMode::Cumulative),
            "reference" | "referencia" => Some(AccrualMode::ReferenceOnly),
            _ => None,
        }
    }
}

/// Words used when describing carried-over months.
#[derive(Debug, Clone)]
pub struct CarryoverLabels {
    pub full: String,
    pub remainder: String,
    pub prefix: String,
}

impl Default for CarryoverLabels {
    fn default() -> Self {
        Self {
            full: "integral".into(),
            remainder: "restante".into(),
            prefix: "Inclui pendências".into(),
        }
    }
}

/// Message bodies. Placeholders: {NOME} {MES} {VALOR} {PENDENCIAS} {PIX}.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    pub notice: String,
    pub reminder: String,
    pub fallback: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            notice: "Olá {NOME}, segue o recibo de cobrança da mensalidade referente ao mês {MES} no valor total em aberto de R$ {VALOR}{PENDENCIAS}.\n\nchave pix: {PIX}".into(),
            reminder: "Olá {NOME}, este é outro lembrete para você efetuar o pagamento de R$ {VALOR}{PENDENCIAS} da sua mensalidade!\n\nchave pix: {PIX}".into(),
            fallback: "Olá {NOME}, segue o recibo referente ao mês {MES} no valor total em aberto de R$ {VALOR}{PENDENCIAS}.".into(),
        }
    }
}

/// Everything the accrual engine and the billing run need to know about the locale.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub months: MonthNames,
    pub accrual_mode: AccrualMode,
    pub labels: CarryoverLabels,
    pub templates: MessageTemplates,
    pub no_phone_sentinel: String,
    pub pix_key: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            months: MonthNames::default(),
            accrual_mode: AccrualMode::default(),
            labels: CarryoverLabels::default(),
            templates: MessageTemplates::default(),
            no_phone_sentinel: "-".into(),
            pix_key: String::new(),
        }
    }
}

/// Who signs the receipt.
#[derive(Debug, Clone, Default)]
pub struct IssuerConfig {
    pub name: String,
    pub document: String,
    pub registration: String,
    pub city: String,
    pub header_image: Option<PathBuf>,
    pub signature_image: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub token: Option<String>,
    pub text_url: String,
    pub media_url: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: Option<String>,
    pub key: Option<String>,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub clients_file: PathBuf,
    pub receipts_dir: PathBuf,
    pub typst_bin: String,
    pub billing: BillingConfig,
    pub issuer: IssuerConfig,
    pub messaging: MessagingConfig,
    pub storage: StorageConfig,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn var_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let accrual_mode = var_opt("ACCRUAL_MODE")
            .map(|raw| {
                AccrualMode::parse(&raw).unwrap_or_else(|| {
                    tracing::warn!(value = %raw, "unknown ACCRUAL_MODE, using cumulative");
                    AccrualMode::Cumulative
                })
            })
            .unwrap_or_default();

        Self {
            port: var_or("PORT", "8080").parse().unwrap_or(8080),
            clients_file: var_or("CLIENTS_FILE", "./dados/base_clientes.json").into(),
            receipts_dir: var_or("RECEIPTS_DIR", "./recibos_gerados").into(),
            typst_bin: var_or("TYPST_BIN", "typst"),
            billing: BillingConfig {
                accrual_mode,
                no_phone_sentinel: var_or("NO_PHONE_SENTINEL", "-"),
                pix_key: var_or("PIX_KEY", ""),
                ..BillingConfig::default()
            },
            issuer: IssuerConfig {
                name: var_or("ISSUER_NAME", ""),
                document: var_or("ISSUER_DOCUMENT", ""),
                registration: var_or("ISSUER_REGISTRATION", ""),
                city: var_or("ISSUER_CITY", ""),
                header_image: var_opt("RECEIPT_HEADER_IMAGE").map(PathBuf::from),
                signature_image: var_opt("RECEIPT_SIGNATURE_IMAGE").map(PathBuf::from),
            },
            messaging: MessagingConfig {
                token: var_opt("GZAPPY_TOKEN"),
                text_url: var_or(
                    "GZAPPY_TEXT_URL",
                    "https://v2-api.gzappy.com/message/send-text",
                ),
                media_url: var_or(
                    "GZAPPY_MEDIA_URL",
                    "https://v2-api.gzappy.com/message/send-media",
                ),
            },
            storage: StorageConfig {
                url: var_opt("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
                key: var_opt("SUPABASE_KEY"),
                bucket: var_or("SUPABASE_BUCKET", "recibos"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrual_mode_accepts_both_spellings() {
        assert_eq!(AccrualMode::parse("cumulative"), Some(AccrualMode::Cumulative));
        assert_eq!(AccrualMode::parse(" Referencia "), Some(AccrualMode::ReferenceOnly));
        assert_eq!(AccrualMode::parse("monthly"), None);
    }

    #[test]
    fn default_templates_carry_every_placeholder_they_need() {
        let templates = MessageTemplates::default();
        for t in [&templates.notice, &templates.fallback] {
            assert!(t.contains("{NOME}") && t.contains("{MES}") && t.contains("{VALOR}"));
        }
        assert!(templates.reminder.contains("{VALOR}"));
    }
}
