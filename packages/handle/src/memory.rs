//! In-memory foreign runtime.
//!
//! A small object heap with JavaScript-like semantics: plain objects, arrays,
//! functions, classes with prototypes, promises and blob URLs. It backs the
//! test suites of every crate in the workspace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use bytes::Bytes;

use crate::{BlobHost, ForeignObject, ForeignValue, Handle, HandleError, ObjectId, Pending, TypeTag};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Arguments of a native function invocation.
pub struct CallContext {
    /// The receiver, for method calls and constructors.
    pub this: Option<Handle>,
    pub args: Vec<ForeignValue>,
}

impl CallContext {
    /// Positional argument, `Undefined` when absent.
    pub fn arg(&self, index: usize) -> ForeignValue {
        self.args.get(index).cloned().unwrap_or_default()
    }
}

/// Body of a native function.
pub type NativeFn = Arc<dyn Fn(CallContext) -> Result<ForeignValue, HandleError> + Send + Sync>;

enum Kind {
    Plain,
    Array,
    Function { source: String, body: NativeFn },
    Class { source: String, init: NativeFn, prototype: Handle },
    Instance { class: Handle },
}

struct MemoryObject {
    id: ObjectId,
    me: Weak<MemoryObject>,
    kind: Kind,
    props: Mutex<Vec<(String, ForeignValue)>>,
    items: Mutex<Vec<ForeignValue>>,
}

fn poisoned() -> HandleError {
    HandleError::thrown("Error", "memory object lock poisoned")
}

impl MemoryObject {
    fn alloc(kind: Kind) -> Handle {
        let object = Arc::new_cyclic(|me| MemoryObject {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            me: me.clone(),
            kind,
            props: Mutex::new(Vec::new()),
            items: Mutex::new(Vec::new()),
        });
        Handle::new(object)
    }

    fn handle(&self) -> Result<Handle, HandleError> {
        self.me
            .upgrade()
            .map(|me| Handle::new(me))
            .ok_or_else(|| HandleError::thrown("ReferenceError", "object was released"))
    }

    fn own(&self, name: &str) -> Result<Option<ForeignValue>, HandleError> {
        let props = self.props.lock().map_err(|_| poisoned())?;
        Ok(props.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()))
    }

    fn array_member(&self, name: &str) -> Result<Option<ForeignValue>, HandleError> {
        let items = self.items.lock().map_err(|_| poisoned())?;
        if name == "length" {
            return Ok(Some(ForeignValue::Integer(items.len() as i64)));
        }
        Ok(name
            .parse::<usize>()
            .ok()
            .map(|i| items.get(i).cloned().unwrap_or_default()))
    }

    fn lookup(&self, name: &str) -> Result<Option<ForeignValue>, HandleError> {
        if let Kind::Array = self.kind {
            if let Some(v) = self.array_member(name)? {
                return Ok(Some(v));
            }
        }
        if let Some(v) = self.own(name)? {
            return Ok(Some(v));
        }
        match &self.kind {
            Kind::Instance { class } => {
                if name == "constructor" {
                    return Ok(Some(ForeignValue::Handle(class.clone())));
                }
                let prototype = class.get("prototype")?;
                match prototype {
                    ForeignValue::Handle(proto) if proto.has(name)? => Ok(Some(proto.get(name)?)),
                    _ => Ok(None),
                }
            }
            Kind::Class { prototype, .. } if name == "prototype" => {
                Ok(Some(ForeignValue::Handle(prototype.clone())))
            }
            _ => Ok(None),
        }
    }
}

fn materialize_value(value: &ForeignValue) -> Result<ForeignValue, HandleError> {
    match value {
        ForeignValue::Handle(h) => h.materialize(),
        ForeignValue::Array(items) => Ok(ForeignValue::Array(
            items.iter().map(materialize_value).collect::<Result<_, _>>()?,
        )),
        ForeignValue::Object(entries) => Ok(ForeignValue::Object(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), materialize_value(v)?)))
                .collect::<Result<_, HandleError>>()?,
        )),
        other => Ok(other.clone()),
    }
}

impl ForeignObject for MemoryObject {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_tag(&self) -> TypeTag {
        match self.kind {
            Kind::Function { .. } | Kind::Class { .. } => TypeTag::Function,
            _ => TypeTag::Object,
        }
    }

    fn get(&self, name: &str) -> Result<ForeignValue, HandleError> {
        Ok(self.lookup(name)?.unwrap_or_default())
    }

    fn set(&self, name: &str, value: ForeignValue) -> Result<(), HandleError> {
        let value = MemoryRuntime::realize(value);
        if let Kind::Array = self.kind {
            if let Ok(index) = name.parse::<usize>() {
                let mut items = self.items.lock().map_err(|_| poisoned())?;
                if index >= items.len() {
                    items.resize(index + 1, ForeignValue::Undefined);
                }
                items[index] = value;
                return Ok(());
            }
        }
        let mut props = self.props.lock().map_err(|_| poisoned())?;
        match props.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => props.push((name.to_string(), value)),
        }
        Ok(())
    }

    fn has(&self, name: &str) -> Result<bool, HandleError> {
        Ok(self.lookup(name)?.is_some())
    }

    fn keys(&self) -> Result<Vec<String>, HandleError> {
        let mut keys = Vec::new();
        if let Kind::Array = self.kind {
            let len = self.items.lock().map_err(|_| poisoned())?.len();
            keys.extend((0..len).map(|i| i.to_string()));
        }
        let props = self.props.lock().map_err(|_| poisoned())?;
        keys.extend(props.iter().map(|(k, _)| k.clone()));
        Ok(keys)
    }

    fn call(
        &self,
        this: Option<&Handle>,
        args: Vec<ForeignValue>,
    ) -> Result<ForeignValue, HandleError> {
        match &self.kind {
            Kind::Function { body, .. } => body(CallContext {
                this: this.cloned(),
                args,
            }),
            Kind::Class { source, .. } => Err(HandleError::thrown(
                "TypeError",
                format!(
                    "Class constructor {} cannot be invoked without 'new'",
                    class_name(source)
                ),
            )),
            _ => Err(HandleError::NotCallable),
        }
    }

    fn construct(&self, args: Vec<ForeignValue>) -> Result<ForeignValue, HandleError> {
        match &self.kind {
            Kind::Class { init, .. } => {
                let instance = MemoryObject::alloc(Kind::Instance {
                    class: self.handle()?,
                });
                init(CallContext {
                    this: Some(instance.clone()),
                    args,
                })?;
                Ok(ForeignValue::Handle(instance))
            }
            _ => Err(HandleError::NotConstructor),
        }
    }

    fn source_text(&self) -> Result<String, HandleError> {
        Ok(match &self.kind {
            Kind::Function { source, .. } | Kind::Class { source, .. } => source.clone(),
            Kind::Array => "[object Array]".to_string(),
            _ => "[object Object]".to_string(),
        })
    }

    fn materialize(&self) -> Result<ForeignValue, HandleError> {
        match self.kind {
            Kind::Plain => {
                let props = self.props.lock().map_err(|_| poisoned())?.clone();
                Ok(ForeignValue::Object(
                    props
                        .iter()
                        .map(|(k, v)| Ok((k.clone(), materialize_value(v)?)))
                        .collect::<Result<_, HandleError>>()?,
                ))
            }
            Kind::Array => {
                let items = self.items.lock().map_err(|_| poisoned())?.clone();
                Ok(ForeignValue::Array(
                    items.iter().map(materialize_value).collect::<Result<_, _>>()?,
                ))
            }
            _ => Ok(ForeignValue::Handle(self.handle()?)),
        }
    }
}

fn class_name(source: &str) -> &str {
    source
        .trim_start()
        .strip_prefix("class")
        .map(str::trim_start)
        .and_then(|rest| rest.split(|c: char| c.is_whitespace() || c == '{').next())
        .unwrap_or("anonymous")
}

/// An in-process foreign heap.
///
/// Also acts as the blob host: `create_object_url` stores the bytes and hands
/// back a `blob:` URL that [`MemoryRuntime::blob`] resolves.
#[derive(Clone, Default)]
pub struct MemoryRuntime {
    blobs: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbound literals become real objects when stored, like a JS engine
    /// materializing `Object.fromEntries(...)` or an array literal.
    fn realize(value: ForeignValue) -> ForeignValue {
        match value {
            ForeignValue::Object(entries) => {
                let obj = MemoryObject::alloc(Kind::Plain);
                for (k, v) in entries {
                    // A fresh object cannot be poisoned.
                    let _ = obj.set(&k, v);
                }
                ForeignValue::Handle(obj)
            }
            ForeignValue::Array(items) => {
                let arr = MemoryObject::alloc(Kind::Array);
                for (i, v) in items.into_iter().enumerate() {
                    let _ = arr.set(&i.to_string(), v);
                }
                ForeignValue::Handle(arr)
            }
            other => other,
        }
    }

    /// A fresh empty plain object.
    pub fn object(&self) -> Handle {
        MemoryObject::alloc(Kind::Plain)
    }

    /// A plain object with the given members.
    pub fn object_from(&self, entries: Vec<(&str, ForeignValue)>) -> Handle {
        let obj = self.object();
        for (k, v) in entries {
            let _ = obj.set(k, v);
        }
        obj
    }

    /// An array object.
    pub fn array(&self, items: Vec<ForeignValue>) -> Handle {
        let arr = MemoryObject::alloc(Kind::Array);
        for (i, v) in items.into_iter().enumerate() {
            let _ = arr.set(&i.to_string(), v);
        }
        arr
    }

    /// A plain function.
    pub fn function<F>(&self, name: &str, body: F) -> Handle
    where
        F: Fn(CallContext) -> Result<ForeignValue, HandleError> + Send + Sync + 'static,
    {
        self.function_with_source(&format!("function {}() {{ [native code] }}", name), body)
    }

    /// A function with explicit source text.
    pub fn function_with_source<F>(&self, source: &str, body: F) -> Handle
    where
        F: Fn(CallContext) -> Result<ForeignValue, HandleError> + Send + Sync + 'static,
    {
        MemoryObject::alloc(Kind::Function {
            source: source.to_string(),
            body: Arc::new(body),
        })
    }

    /// A class whose constructor runs `init` with `this` bound to the new
    /// instance.
    pub fn class<F>(&self, name: &str, init: F) -> Handle
    where
        F: Fn(CallContext) -> Result<ForeignValue, HandleError> + Send + Sync + 'static,
    {
        self.class_with_source(&format!("class {} {{\n  constructor() {{}}\n}}", name), init)
    }

    pub fn class_with_source<F>(&self, source: &str, init: F) -> Handle
    where
        F: Fn(CallContext) -> Result<ForeignValue, HandleError> + Send + Sync + 'static,
    {
        MemoryObject::alloc(Kind::Class {
            source: source.to_string(),
            init: Arc::new(init),
            prototype: self.object(),
        })
    }

    /// Define an instance method on a class.
    pub fn define_method<F>(&self, class: &Handle, name: &str, body: F) -> Result<(), HandleError>
    where
        F: Fn(CallContext) -> Result<ForeignValue, HandleError> + Send + Sync + 'static,
    {
        let prototype = class
            .get("prototype")?
            .into_handle()
            .ok_or_else(|| HandleError::thrown("TypeError", "not a class"))?;
        prototype.set(name, ForeignValue::Handle(self.function(name, body)))
    }

    /// A resolved promise.
    pub fn promise(&self, value: ForeignValue) -> ForeignValue {
        ForeignValue::Pending(Pending::ready(Ok(value)))
    }

    /// A rejected promise.
    pub fn rejected(&self, error: HandleError) -> ForeignValue {
        ForeignValue::Pending(Pending::ready(Err(error)))
    }

    /// Bytes behind a URL from `create_object_url`.
    pub fn blob(&self, url: &str) -> Option<Bytes> {
        self.blobs.lock().ok()?.get(url).cloned()
    }
}

impl BlobHost for MemoryRuntime {
    fn create_object_url(&self, data: Bytes) -> Result<String, HandleError> {
        let url = format!("blob:memory/{}", uuid::Uuid::new_v4());
        self.blobs
            .lock()
            .map_err(|_| poisoned())?
            .insert(url.clone(), data);
        Ok(url)
    }
}
