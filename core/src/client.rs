//! Client records and the request shapes that target them.
//!
//! Request bodies arrive as untyped JSON. [`ClientQuery::from_json`] and
//! [`UpsertPayload::from_json`] are the only way to build the typed shapes,
//! and they reject malformed input with a [`Failure`] instead of panicking or
//! trusting caller-supplied types.

use crate::cpf::Cpf;
use crate::outcome::Failure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identifier of a client. Assigned by the store on creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Creates a new random `ClientId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ClientId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A stored client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    /// Immutable identifier
    pub id: ClientId,
    /// Full name
    pub nome: String,
    /// CPF, unique across clients when present
    pub cpf: Option<Cpf>,
    /// Contact email
    pub email: Option<String>,
    /// City
    pub cidade: String,
    /// Federative unit (state) code
    pub estado_uf: String,
    /// How the client uses the platform
    pub uso_plataforma: Option<String>,
    /// Professional field
    pub area_atuacao: Option<String>,
    /// Organizational unit; `None` means unclassified
    pub unidade: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl ClientRecord {
    /// Build a record from validated create fields.
    #[must_use]
    pub fn from_new(id: ClientId, fields: NewClient, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            nome: fields.nome,
            cpf: fields.cpf,
            email: fields.email,
            cidade: fields.cidade,
            estado_uf: fields.estado_uf,
            uso_plataforma: fields.uso_plataforma,
            area_atuacao: fields.area_atuacao,
            unidade: fields.unidade,
            created_at,
        }
    }
}

/// Validated fields for creating a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewClient {
    /// Full name
    pub nome: String,
    /// CPF
    pub cpf: Option<Cpf>,
    /// Contact email
    pub email: Option<String>,
    /// City
    pub cidade: String,
    /// Federative unit code
    pub estado_uf: String,
    /// Platform usage
    pub uso_plataforma: Option<String>,
    /// Professional field
    pub area_atuacao: Option<String>,
    /// Organizational unit
    pub unidade: Option<String>,
}

impl NewClient {
    /// The same fields expressed as a partial update.
    #[must_use]
    pub fn into_changes(self) -> ClientChanges {
        ClientChanges {
            nome: Some(self.nome),
            cpf: self.cpf,
            email: self.email,
            cidade: Some(self.cidade),
            estado_uf: Some(self.estado_uf),
            uso_plataforma: self.uso_plataforma,
            area_atuacao: self.area_atuacao,
            unidade: self.unidade,
        }
    }
}

/// Partial update: `Some` overrides the stored value, `None` leaves it alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientChanges {
    /// Full name
    pub nome: Option<String>,
    /// CPF
    pub cpf: Option<Cpf>,
    /// Contact email
    pub email: Option<String>,
    /// City
    pub cidade: Option<String>,
    /// Federative unit code
    pub estado_uf: Option<String>,
    /// Platform usage
    pub uso_plataforma: Option<String>,
    /// Professional field
    pub area_atuacao: Option<String>,
    /// Organizational unit
    pub unidade: Option<String>,
}

impl ClientChanges {
    /// Whether no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nome.is_none()
            && self.cpf.is_none()
            && self.email.is_none()
            && self.cidade.is_none()
            && self.estado_uf.is_none()
            && self.uso_plataforma.is_none()
            && self.area_atuacao.is_none()
            && self.unidade.is_none()
    }

    /// Merge the present fields into `record`. `id` and `created_at` never change.
    pub fn apply_to(&self, record: &mut ClientRecord) {
        fn merge<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
        fn merge_opt<T: Clone>(slot: &mut Option<T>, value: Option<&T>) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }

        merge(&mut record.nome, self.nome.as_ref());
        merge_opt(&mut record.cpf, self.cpf.as_ref());
        merge_opt(&mut record.email, self.email.as_ref());
        merge(&mut record.cidade, self.cidade.as_ref());
        merge(&mut record.estado_uf, self.estado_uf.as_ref());
        merge_opt(&mut record.uso_plataforma, self.uso_plataforma.as_ref());
        merge_opt(&mut record.area_atuacao, self.area_atuacao.as_ref());
        merge_opt(&mut record.unidade, self.unidade.as_ref());
    }
}

// ============================================================================
// Boundary parsing
// ============================================================================

/// Trim, and treat blank strings as absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fields accepted by the lookup endpoint.
#[derive(Debug, Default, Deserialize)]
struct RawQuery {
    cpf: Option<String>,
    email: Option<String>,
    nome: Option<String>,
}

/// Criteria for finding a single client.
///
/// At least one field is always present; `cpf` is already normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientQuery {
    /// Normalized CPF
    pub cpf: Option<Cpf>,
    /// Trimmed email
    pub email: Option<String>,
    /// Trimmed name
    pub nome: Option<String>,
}

impl ClientQuery {
    /// Validate a query built from typed fields.
    ///
    /// # Errors
    ///
    /// Returns an `INVALID_QUERY` failure when every field is blank or the
    /// CPF does not normalize to eleven digits.
    pub fn new(
        cpf: Option<String>,
        email: Option<String>,
        nome: Option<String>,
    ) -> Result<Self, Failure> {
        let cpf = clean(cpf)
            .map(|raw| Cpf::parse(&raw))
            .transpose()
            .map_err(|e| Failure::invalid_query(e.to_string()))?;
        let email = clean(email);
        let nome = clean(nome);

        if cpf.is_none() && email.is_none() && nome.is_none() {
            return Err(Failure::invalid_query(
                "At least one of cpf, email or nome is required",
            ));
        }

        Ok(Self { cpf, email, nome })
    }

    /// Parse and validate an untyped lookup body.
    ///
    /// # Errors
    ///
    /// Returns an `INVALID_QUERY` failure when the body is not an object of
    /// optional strings, or when [`ClientQuery::new`] rejects it.
    pub fn from_json(body: serde_json::Value) -> Result<Self, Failure> {
        let raw: RawQuery = serde_json::from_value(body)
            .map_err(|e| Failure::invalid_query(format!("Malformed query: {e}")))?;
        Self::new(raw.cpf, raw.email, raw.nome)
    }
}

/// Fields accepted by the upsert endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpsert {
    id: Option<String>,
    nome: Option<String>,
    cpf: Option<String>,
    email: Option<String>,
    cidade: Option<String>,
    estado_uf: Option<String>,
    uso_plataforma: Option<String>,
    area_atuacao: Option<String>,
    unidade: Option<String>,
}

/// A validated upsert request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpsertPayload {
    /// No `id` supplied: create a new client
    Create(NewClient),
    /// `id` supplied: partially update that client
    Update {
        /// Target client
        id: ClientId,
        /// Fields to override
        changes: ClientChanges,
    },
}

impl UpsertPayload {
    /// Parse and validate an untyped upsert body.
    ///
    /// Strings are trimmed and blank optional fields count as absent. A create
    /// requires `nome`, `cidade` and `estadoUf`; an update may omit them, but
    /// may not blank them out.
    ///
    /// # Errors
    ///
    /// Returns an `INVALID_INPUT` failure for non-object bodies, fields of the
    /// wrong type, a malformed `id`, missing or blank required fields, or a
    /// CPF that does not normalize to eleven digits.
    pub fn from_json(body: serde_json::Value) -> Result<Self, Failure> {
        let raw: RawUpsert = serde_json::from_value(body)
            .map_err(|e| Failure::invalid_input(format!("Malformed payload: {e}")))?;

        let id = clean(raw.id)
            .map(|id| Uuid::parse_str(&id).map(ClientId::from_uuid))
            .transpose()
            .map_err(|e| Failure::invalid_input(format!("Invalid id: {e}")))?;
        let cpf = clean(raw.cpf)
            .map(|value| Cpf::parse(&value))
            .transpose()
            .map_err(|e| Failure::invalid_input(e.to_string()))?;

        let required = |name: &str, value: Option<String>| -> Result<Option<String>, Failure> {
            match value {
                Some(v) if v.trim().is_empty() => {
                    Err(Failure::invalid_input(format!("{name} must not be blank")))
                },
                other => Ok(clean(other)),
            }
        };
        let nome = required("nome", raw.nome)?;
        let cidade = required("cidade", raw.cidade)?;
        let estado_uf = required("estadoUf", raw.estado_uf)?;

        let email = clean(raw.email);
        let uso_plataforma = clean(raw.uso_plataforma);
        let area_atuacao = clean(raw.area_atuacao);
        let unidade = clean(raw.unidade);

        if let Some(id) = id {
            return Ok(Self::Update {
                id,
                changes: ClientChanges {
                    nome,
                    cpf,
                    email,
                    cidade,
                    estado_uf,
                    uso_plataforma,
                    area_atuacao,
                    unidade,
                },
            });
        }

        let missing: Vec<&str> = [
            ("nome", nome.is_none()),
            ("cidade", cidade.is_none()),
            ("estadoUf", estado_uf.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (nome, cidade, estado_uf) {
            (Some(nome), Some(cidade), Some(estado_uf)) => Ok(Self::Create(NewClient {
                nome,
                cpf,
                email,
                cidade,
                estado_uf,
                uso_plataforma,
                area_atuacao,
                unidade,
            })),
            _ => Err(Failure::invalid_input(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ErrorCode;
    use serde_json::json;

    fn code<T>(result: Result<T, Failure>) -> Option<ErrorCode> {
        result.err().map(|f| f.code)
    }

    #[test]
    fn query_normalizes_cpf_and_trims() {
        let query = ClientQuery::from_json(json!({
            "cpf": "123.456.789-09",
            "nome": "  Ana Souza "
        }));
        let query = query.ok();
        assert_eq!(
            query.as_ref().and_then(|q| q.cpf.as_ref()).map(Cpf::as_str),
            Some("12345678909")
        );
        assert_eq!(
            query.as_ref().and_then(|q| q.nome.as_deref()),
            Some("Ana Souza")
        );
    }

    #[test]
    fn query_requires_a_field() {
        assert_eq!(
            code(ClientQuery::from_json(json!({}))),
            Some(ErrorCode::InvalidQuery)
        );
        assert_eq!(
            code(ClientQuery::from_json(json!({ "nome": "   ", "email": "" }))),
            Some(ErrorCode::InvalidQuery)
        );
    }

    #[test]
    fn query_rejects_wrong_types_and_bad_cpf() {
        assert_eq!(
            code(ClientQuery::from_json(json!({ "cpf": 12_345_678_909_u64 }))),
            Some(ErrorCode::InvalidQuery)
        );
        assert_eq!(
            code(ClientQuery::from_json(json!(["cpf"]))),
            Some(ErrorCode::InvalidQuery)
        );
        assert_eq!(
            code(ClientQuery::from_json(json!({ "cpf": "123" }))),
            Some(ErrorCode::InvalidQuery)
        );
    }

    #[test]
    #[allow(clippy::panic)] // Test code can panic
    fn upsert_without_id_is_a_create() {
        let payload = UpsertPayload::from_json(json!({
            "nome": "Ana Souza",
            "cpf": "123.456.789-09",
            "cidade": "Recife",
            "estadoUf": "PE",
            "email": "  ",
            "unidade": "Clínica Norte"
        }));
        let Ok(UpsertPayload::Create(fields)) = payload else {
            panic!("expected a create, got {payload:?}");
        };
        assert_eq!(fields.nome, "Ana Souza");
        assert_eq!(fields.email, None);
        assert_eq!(fields.unidade.as_deref(), Some("Clínica Norte"));
        assert_eq!(fields.cpf.map(|c| c.to_string()), Some("12345678909".to_string()));
    }

    #[test]
    fn create_requires_name_city_and_state() {
        let result = UpsertPayload::from_json(json!({ "nome": "Ana" }));
        let failure = result.err();
        assert_eq!(failure.as_ref().map(|f| f.code), Some(ErrorCode::InvalidInput));
        assert_eq!(
            failure.map(|f| f.message),
            Some("Missing required fields: cidade, estadoUf".to_string())
        );
    }

    #[test]
    fn upsert_rejects_wrong_types() {
        assert_eq!(
            code(UpsertPayload::from_json(json!({
                "nome": 42, "cidade": "Recife", "estadoUf": "PE"
            }))),
            Some(ErrorCode::InvalidInput)
        );
        assert_eq!(
            code(UpsertPayload::from_json(json!("nome=Ana"))),
            Some(ErrorCode::InvalidInput)
        );
        assert_eq!(
            code(UpsertPayload::from_json(json!({
                "id": "not-a-uuid", "nome": "Ana"
            }))),
            Some(ErrorCode::InvalidInput)
        );
    }

    #[test]
    fn upsert_rejects_short_cpf() {
        assert_eq!(
            code(UpsertPayload::from_json(json!({
                "nome": "Ana", "cidade": "Recife", "estadoUf": "PE", "cpf": "123.456"
            }))),
            Some(ErrorCode::InvalidInput)
        );
    }

    #[test]
    fn update_is_partial() {
        let id = ClientId::new();
        let payload = UpsertPayload::from_json(json!({
            "id": id.to_string(),
            "cidade": "Olinda"
        }));
        assert_eq!(
            payload,
            Ok(UpsertPayload::Update {
                id,
                changes: ClientChanges {
                    cidade: Some("Olinda".to_string()),
                    ..ClientChanges::default()
                },
            })
        );
    }

    #[test]
    fn update_may_not_blank_required_fields() {
        let id = ClientId::new();
        assert_eq!(
            code(UpsertPayload::from_json(json!({
                "id": id.to_string(),
                "nome": "  "
            }))),
            Some(ErrorCode::InvalidInput)
        );
    }

    #[test]
    fn changes_apply_only_present_fields() {
        let mut record = ClientRecord::from_new(
            ClientId::new(),
            NewClient {
                nome: "Ana".to_string(),
                cpf: None,
                email: Some("ana@example.com".to_string()),
                cidade: "Recife".to_string(),
                estado_uf: "PE".to_string(),
                uso_plataforma: None,
                area_atuacao: None,
                unidade: None,
            },
            Utc::now(),
        );
        let before = record.clone();

        ClientChanges {
            cidade: Some("Olinda".to_string()),
            unidade: Some("Sul".to_string()),
            ..ClientChanges::default()
        }
        .apply_to(&mut record);

        assert_eq!(record.id, before.id);
        assert_eq!(record.nome, "Ana");
        assert_eq!(record.email, before.email);
        assert_eq!(record.cidade, "Olinda");
        assert_eq!(record.unidade.as_deref(), Some("Sul"));
    }

    #[test]
    fn record_json_is_camel_case() {
        let record = ClientRecord::from_new(
            ClientId::new(),
            NewClient {
                nome: "Ana".to_string(),
                cpf: Cpf::parse("12345678909").ok(),
                email: None,
                cidade: "Recife".to_string(),
                estado_uf: "PE".to_string(),
                uso_plataforma: Some("Diária".to_string()),
                area_atuacao: None,
                unidade: None,
            },
            Utc::now(),
        );
        let value = serde_json::to_value(&record).unwrap_or_default();
        assert_eq!(value["estadoUf"], json!("PE"));
        assert_eq!(value["usoPlataforma"], json!("Diária"));
        assert_eq!(value["cpf"], json!("12345678909"));
    }
}
