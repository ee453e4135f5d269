//! Reconciler - drives create/read/update/delete for a single object
//!
//! Lifecycle: `Unmanaged → create → Managed(id) → {read | update}* → delete →
//! Unmanaged`.
//!
//! Every write is followed by a read. The state returned from [`Reconciler::create`]
//! and [`Reconciler::update`] is what the server confirmed, never what was
//! submitted, so server-side defaulting or coercion shows up immediately.

use crate::client::{GetQuery, RemoteApi, RemoteEntity};
use crate::codec::ResourceCodec;
use crate::error::{Error, Operation, Result};
use crate::types::{ReadOutcome, ResourceState};

/// Stateless CRUD orchestrator over a codec and a remote API
pub struct Reconciler<'a, C, A> {
    codec: &'a C,
    api: &'a A,
}

impl<'a, C, A> Reconciler<'a, C, A>
where
    C: ResourceCodec,
    C::Entity: RemoteEntity,
    A: RemoteApi<Entity = C::Entity>,
{
    pub fn new(codec: &'a C, api: &'a A) -> Self {
        Self { codec, api }
    }

    pub fn codec(&self) -> &'a C {
        self.codec
    }

    /// Create the remote object and return its server-confirmed state.
    ///
    /// If the create succeeds but the follow-up read fails, the error is
    /// [`Error::Unsynchronized`] and carries the new identifier.
    pub fn create(&self, config: &C::Config) -> Result<ResourceState<C::Config>> {
        let entity = self.codec.encode(config)?;
        log::debug!("Creating {}", self.codec.resource_type());

        let ids = self
            .api
            .create(std::slice::from_ref(&entity))
            .map_err(|e| Error::rejected(Operation::Create, e))?;
        let id = ids
            .into_iter()
            .next()
            .ok_or_else(|| Error::rejected(Operation::Create, "no identifier returned"))?;
        log::trace!("Created {} {id}: {entity:?}", self.codec.resource_type());

        self.resync(id)
    }

    /// Fetch the object by identifier and decode it.
    ///
    /// Exactly one match is required: zero is [`Error::NotFound`], more
    /// than one is [`Error::AmbiguousResult`].
    pub fn read(&self, id: &str) -> Result<C::Config> {
        log::debug!("Lookup of {} with id {id}", self.codec.resource_type());

        let mut found = self
            .api
            .get(&GetQuery::by_id(id))
            .map_err(|e| Error::rejected(Operation::Read, e))?;

        match found.len() {
            0 => Err(Error::NotFound {
                resource_type: self.codec.resource_type(),
                id: id.to_string(),
            }),
            1 => {
                let entity = found.remove(0);
                log::trace!("Got {}: {entity:?}", self.codec.resource_type());
                self.codec.decode(&entity)
            }
            count => Err(Error::AmbiguousResult {
                resource_type: self.codec.resource_type(),
                id: id.to_string(),
                count,
            }),
        }
    }

    /// Drift-detection read: an object deleted out-of-band is
    /// [`ReadOutcome::Gone`] instead of an error. Ambiguity is still fatal.
    pub fn refresh(&self, id: &str) -> Result<ReadOutcome<C::Config>> {
        match self.read(id) {
            Ok(config) => Ok(ReadOutcome::Present(config)),
            Err(Error::NotFound { .. }) => {
                log::info!(
                    "{} {id} no longer exists remotely",
                    self.codec.resource_type()
                );
                Ok(ReadOutcome::Gone)
            }
            Err(e) => Err(e),
        }
    }

    /// Push the full configuration to an existing object, then re-read it.
    ///
    /// Encoding happens before any request, so codec errors never reach
    /// the API.
    pub fn update(&self, id: &str, config: &C::Config) -> Result<ResourceState<C::Config>> {
        let mut entity = self.codec.encode(config)?;
        entity.set_remote_id(id);
        log::debug!("Updating {} {id}", self.codec.resource_type());

        self.api
            .update(std::slice::from_ref(&entity))
            .map_err(|e| Error::rejected(Operation::Update, e))?;

        self.resync(id.to_string())
    }

    /// Delete the object; the resulting state is always `Unmanaged`.
    pub fn delete(&self, id: &str) -> Result<ResourceState<C::Config>> {
        log::debug!("Deleting {} {id}", self.codec.resource_type());
        self.api
            .delete(&[id.to_string()])
            .map_err(|e| Error::rejected(Operation::Delete, e))?;
        Ok(ResourceState::Unmanaged)
    }

    fn resync(&self, id: String) -> Result<ResourceState<C::Config>> {
        match self.read(&id) {
            Ok(config) => Ok(ResourceState::Managed { id, config }),
            Err(source) => Err(Error::Unsynchronized {
                id,
                source: Box::new(source),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{EnumTable, decode_flag, encode_flag};
    use crate::mock::{MockApi, MockCall};
    use crate::schema::{FieldKind, FieldSpec, ResourceSchema};
    use serde::Serialize;
    use std::sync::LazyLock;

    static LEVELS: LazyLock<EnumTable> =
        LazyLock::new(|| EnumTable::new("level", &[("low", "0"), ("high", "1")]));

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct CheckConfig {
        target: String,
        level: String,
        port: Option<String>,
        secure: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct CheckEntity {
        id: Option<String>,
        target: String,
        level: String,
        port: String,
        secure: String,
    }

    impl RemoteEntity for CheckEntity {
        fn remote_id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_remote_id(&mut self, id: &str) {
            self.id = Some(id.to_string());
        }
    }

    struct CheckCodec {
        schema: ResourceSchema,
    }

    impl CheckCodec {
        fn new() -> Self {
            Self {
                schema: ResourceSchema::new("check")
                    .field(FieldSpec::required("target", "Target host"))
                    .field(FieldSpec::required("level", "Severity").with_kind(
                        FieldKind::Enum {
                            symbols: LEVELS.symbols(),
                        },
                    ))
                    .field(FieldSpec::string_default("port", "80", "Port"))
                    .field(FieldSpec::bool_default("secure", false, "Use TLS")),
            }
        }
    }

    impl ResourceCodec for CheckCodec {
        type Config = CheckConfig;
        type Entity = CheckEntity;

        fn schema(&self) -> &ResourceSchema {
            &self.schema
        }

        fn encode(&self, config: &CheckConfig) -> Result<CheckEntity> {
            Ok(CheckEntity {
                id: None,
                target: self.schema.require("target", &config.target)?.to_string(),
                level: LEVELS
                    .to_code(self.schema.require("level", &config.level)?)?
                    .to_string(),
                port: self.schema.resolve("port", config.port.as_deref()).to_string(),
                secure: encode_flag(config.secure),
            })
        }

        fn decode(&self, entity: &CheckEntity) -> Result<CheckConfig> {
            Ok(CheckConfig {
                target: entity.target.clone(),
                level: LEVELS.to_symbol(&entity.level)?.to_string(),
                port: Some(entity.port.clone()),
                secure: decode_flag(&entity.secure),
            })
        }

        fn materialize(&self, config: &CheckConfig) -> CheckConfig {
            CheckConfig {
                port: Some(self.schema.resolve("port", config.port.as_deref()).to_string()),
                ..config.clone()
            }
        }
    }

    fn config() -> CheckConfig {
        CheckConfig {
            target: "example.com".into(),
            level: "high".into(),
            port: None,
            secure: true,
        }
    }

    #[test]
    fn test_create_then_reads_back() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);

        let state = reconciler.create(&config()).unwrap();
        assert_eq!(state.id(), Some("1000"));
        assert_eq!(state.config(), Some(&codec.materialize(&config())));

        let calls = api.calls();
        assert_eq!(calls[0], MockCall::Create { count: 1 });
        assert_eq!(calls[1], MockCall::Get(GetQuery::by_id("1000")));
    }

    #[test]
    fn test_create_reflects_server_normalization() {
        let codec = CheckCodec::new();
        let api = MockApi::new().with_normalizer(|e: &mut CheckEntity| {
            e.target = e.target.to_uppercase();
        });
        let reconciler = Reconciler::new(&codec, &api);

        let state = reconciler.create(&config()).unwrap();
        assert_eq!(state.config().unwrap().target, "EXAMPLE.COM");
    }

    #[test]
    fn test_create_rejected() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        api.reject_next("invalid params");
        let reconciler = Reconciler::new(&codec, &api);

        let err = reconciler.create(&config()).unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteRejected {
                operation: Operation::Create,
                ..
            }
        ));
        assert!(api.is_empty());
    }

    #[test]
    fn test_create_missing_required_makes_no_call() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);

        let mut cfg = config();
        cfg.target = String::new();
        let err = reconciler.create(&cfg).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { ref field } if field == "target"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_read_not_found() {
        let codec = CheckCodec::new();
        let api: MockApi<CheckEntity> = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);

        let err = reconciler.read("404").unwrap_err();
        assert!(matches!(err, Error::NotFound { ref id, .. } if id == "404"));
    }

    #[test]
    fn test_read_ambiguous() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);
        let state = reconciler.create(&config()).unwrap();
        let id = state.id().unwrap();

        api.duplicate(id);
        let err = reconciler.read(id).unwrap_err();
        assert!(matches!(err, Error::AmbiguousResult { count: 2, .. }));

        // Ambiguity is never downgraded by refresh
        assert!(reconciler.refresh(id).is_err());
    }

    #[test]
    fn test_read_unknown_code_fails() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let id = api.insert(CheckEntity {
            id: None,
            target: "x".into(),
            level: "7".into(),
            port: "80".into(),
            secure: "0".into(),
        });
        let reconciler = Reconciler::new(&codec, &api);

        let err = reconciler.read(&id).unwrap_err();
        assert!(matches!(err, Error::UnknownEnumValue { table: "level", .. }));
    }

    #[test]
    fn test_refresh_gone() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);
        let state = reconciler.create(&config()).unwrap();
        let id = state.id().unwrap().to_string();

        assert!(matches!(
            reconciler.refresh(&id).unwrap(),
            ReadOutcome::Present(_)
        ));
        api.remove(&id);
        assert_eq!(reconciler.refresh(&id).unwrap(), ReadOutcome::Gone);
    }

    #[test]
    fn test_update_then_reads_back() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);
        let state = reconciler.create(&config()).unwrap();
        let id = state.id().unwrap().to_string();

        let mut changed = config();
        changed.level = "low".into();
        changed.port = Some("8080".into());
        let state = reconciler.update(&id, &changed).unwrap();

        assert_eq!(state.id(), Some(id.as_str()));
        assert_eq!(state.config(), Some(&changed));
        assert_eq!(api.entity(&id).unwrap().level, "0");
        assert!(matches!(api.calls()[3], MockCall::Get(_)));
    }

    #[test]
    fn test_update_unknown_enum_makes_no_call() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);
        let id = reconciler.create(&config()).unwrap().id().unwrap().to_string();
        let before = api.calls().len();

        let mut bad = config();
        bad.level = "extreme".into();
        let err = reconciler.update(&id, &bad).unwrap_err();
        assert!(matches!(err, Error::UnknownEnumValue { .. }));
        assert_eq!(api.calls().len(), before);
    }

    #[test]
    fn test_update_rejected_leaves_remote_untouched() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);
        let id = reconciler.create(&config()).unwrap().id().unwrap().to_string();

        api.reject_next("permission denied");
        let mut changed = config();
        changed.target = "other.example.com".into();
        let err = reconciler.update(&id, &changed).unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteRejected {
                operation: Operation::Update,
                ..
            }
        ));
        assert_eq!(api.entity(&id).unwrap().target, "example.com");
    }

    #[test]
    fn test_update_of_deleted_object_is_rejected() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);
        let id = reconciler.create(&config()).unwrap().id().unwrap().to_string();
        api.remove(&id);

        let err = reconciler.update(&id, &config()).unwrap_err();
        assert!(matches!(err, Error::RemoteRejected { .. }));
    }

    #[test]
    fn test_post_write_read_failure_keeps_identifier() {
        let codec = CheckCodec::new();
        let api = MockApi::new().with_normalizer(|e: &mut CheckEntity| {
            e.level = "9".into();
        });
        let reconciler = Reconciler::new(&codec, &api);

        let err = reconciler.create(&config()).unwrap_err();
        match err {
            Error::Unsynchronized { id, source } => {
                assert_eq!(id, "1000");
                assert!(matches!(*source, Error::UnknownEnumValue { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_delete() {
        let codec = CheckCodec::new();
        let api = MockApi::new();
        let reconciler = Reconciler::new(&codec, &api);
        let id = reconciler.create(&config()).unwrap().id().unwrap().to_string();

        let state = reconciler.delete(&id).unwrap();
        assert_eq!(state, ResourceState::Unmanaged);
        assert!(api.is_empty());

        let err = reconciler.delete(&id).unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteRejected {
                operation: Operation::Delete,
                ..
            }
        ));
    }
}
