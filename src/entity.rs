// Customer entity - the canonical, validated purchase-history record
// Construction normalizes, computes checksum flags and assigns identity

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CustomerError, FieldViolation};
use crate::ids::{is_valid_cnpj, is_valid_cpf};
use crate::normalize::sanitize;
use crate::parser::CustomerFields;

/// Maximum stored length of the cpf column (mirrors the schema)
pub const MAX_CPF_LEN: usize = 20;
/// Maximum stored length of the store-CNPJ columns
pub const MAX_STORE_LEN: usize = 20;

// ============================================================================
// IDENTITY
// ============================================================================

/// Identity shared by every persisted record: a unique id plus creation
/// timestamp, assigned exactly once at construction and never mutated.
///
/// Ids are UUIDv7, so their string form sorts lexicographically by creation
/// order and doubles as the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    fn new() -> Self {
        Identity {
            id: Uuid::now_v7().to_string(),
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// CUSTOMER
// ============================================================================

/// A fully-validated customer purchase-history record.
///
/// Text identity fields are stored sanitized (ASCII-folded, uppercased,
/// `NULL` sentinel for empty); the `*_valido` flags carry the checksum
/// verdict over those sanitized values. A checksum failure never blocks
/// construction - invalidity is recorded, not rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(flatten)]
    pub identity: Identity,
    pub cpf: String,
    pub cpf_valido: bool,
    pub private: String,
    pub incompleto: String,
    pub data_ultima_compra: Option<NaiveDate>,
    pub ticket_medio: f64,
    pub ticket_ultima_compra: f64,
    pub loja_mais_frequente: String,
    pub cnpj_loja_mais_frequente_valido: bool,
    pub loja_ultima_compra: String,
    pub cnpj_loja_ultima_compra_valido: bool,
}

impl Customer {
    /// Build a canonical record from a parsed field set.
    ///
    /// Either returns a complete record with fresh identity, or a
    /// `Structural` error naming every violated field - never a partial
    /// record.
    pub fn new(fields: CustomerFields) -> Result<Customer, CustomerError> {
        let cpf = sanitize(&fields.cpf);
        let loja_mais_frequente = sanitize(&fields.loja_mais_frequente);
        let loja_ultima_compra = sanitize(&fields.loja_ultima_compra);

        let customer = Customer {
            identity: Identity::new(),
            cpf_valido: is_valid_cpf(&cpf),
            cpf,
            private: fields.private,
            incompleto: fields.incompleto,
            data_ultima_compra: fields.data_ultima_compra,
            ticket_medio: fields.ticket_medio,
            ticket_ultima_compra: fields.ticket_ultima_compra,
            cnpj_loja_mais_frequente_valido: is_valid_cnpj(&loja_mais_frequente),
            loja_mais_frequente,
            cnpj_loja_ultima_compra_valido: is_valid_cnpj(&loja_ultima_compra),
            loja_ultima_compra,
        };

        let violations = customer.validate();
        if violations.is_empty() {
            Ok(customer)
        } else {
            Err(CustomerError::Structural(violations))
        }
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.identity.created_at
    }

    /// Structural validation mirroring the persistence schema. Collects
    /// every violation instead of stopping at the first.
    fn validate(&self) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        if self.cpf.chars().count() > MAX_CPF_LEN {
            violations.push(FieldViolation {
                field: "cpf".to_string(),
                message: format!("must be at most {} characters", MAX_CPF_LEN),
            });
        }

        for (field, value) in [
            ("loja_mais_frequente", &self.loja_mais_frequente),
            ("loja_ultima_compra", &self.loja_ultima_compra),
        ] {
            if value.chars().count() > MAX_STORE_LEN {
                violations.push(FieldViolation {
                    field: field.to_string(),
                    message: format!("must be at most {} characters", MAX_STORE_LEN),
                });
            }
        }

        for (field, value) in [
            ("ticket_medio", self.ticket_medio),
            ("ticket_ultima_compra", self.ticket_ultima_compra),
        ] {
            // catches negatives and NaN alike
            if !(value >= 0.0) {
                violations.push(FieldViolation {
                    field: field.to_string(),
                    message: "must be a non-negative amount".to_string(),
                });
            }
        }

        violations
    }
}

// ============================================================================
// TESTS
// ============================================================================
