use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tjs_handle::{ForeignValue, Handle};
use tracing::debug;

use crate::codec::{encode, encode_call_args};
use crate::proxy::class::read_input;
use crate::proxy::{ForeignProxy, Index};
use crate::{Error, Kwargs, Library, Result, Value};

lazy_static! {
    static ref CLASS_DEFINITION: Regex = Regex::new(r"^\s*class\s+([a-zA-Z0-9_]+)\s*\{").unwrap();
}

/// Whether a handle looks like a class definition.
///
/// This is a heuristic: the handle is a function whose source text starts
/// with `class Name {`. Native or bound constructors are not recognized.
pub(crate) fn looks_like_class(handle: &Handle) -> Result<bool> {
    if !handle.is_function() {
        return Ok(false);
    }
    Ok(CLASS_DEFINITION.is_match(&handle.source_text()?))
}

/// The default proxy: forwards everything to the wrapped handle.
#[derive(Clone)]
pub struct GenericProxy {
    handle: Handle,
    library: Library,
    receiver: Option<Handle>,
    is_class: bool,
    /// Set on `RawImage.read`: the first argument is coerced to a URL.
    reads_media: bool,
}

impl GenericProxy {
    pub fn new(handle: Handle, library: Library) -> Result<Self> {
        let is_class = looks_like_class(&handle)?;
        Ok(Self {
            handle,
            library,
            receiver: None,
            is_class,
            reads_media: false,
        })
    }

    #[must_use]
    pub fn bound_to(mut self, receiver: Handle) -> Self {
        self.receiver = Some(receiver);
        self
    }

    #[must_use]
    pub(crate) fn reading_media(mut self) -> Self {
        self.reads_media = true;
        self
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn into_handle(self) -> Handle {
        self.handle
    }

    pub fn receiver(&self) -> Option<&Handle> {
        self.receiver.as_ref()
    }

    pub fn is_class(&self) -> bool {
        self.is_class
    }

    /// Own member names of the wrapped object.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.handle.keys()?)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.keys()?.is_empty())
    }

    pub fn iter(&self) -> Result<std::vec::IntoIter<String>> {
        Ok(self.keys()?.into_iter())
    }

    pub(crate) fn encode_args(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Vec<ForeignValue>> {
        encode_call_args(args, kwargs, self.library.blob_host())
    }

    fn encode_read_args(&self, mut args: Vec<Value>, kwargs: Kwargs) -> Result<Vec<ForeignValue>> {
        if args.is_empty() {
            return self.encode_args(args, kwargs);
        }
        let mut encoded = vec![read_input(args.remove(0), &self.library)?];
        encoded.extend(self.encode_args(args, kwargs)?);
        Ok(encoded)
    }

    /// Construct regardless of the class heuristic.
    pub(crate) fn construct(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        let args = self.encode_args(args, kwargs)?;
        let res = self.handle.construct(args)?;
        self.library.decode(res)
    }

    /// Read a member; functions come back bound to this object.
    pub(crate) fn get_member(&self, name: &str) -> Result<Value> {
        match self.handle.get(name)? {
            ForeignValue::Handle(member) if member.is_function() => {
                let proxy = self.library.wrap(member)?;
                Ok(Value::Proxy(proxy.bound_to(self.handle.clone())))
            }
            other => self.library.decode(other),
        }
    }

    pub(crate) fn key_name(key: Index) -> Result<String> {
        match key {
            Index::Name(name) => Ok(name),
            Index::Position(i) => Ok(i.to_string()),
            Index::Slice(_) | Index::Axes(_) => Err(Error::precondition(
                "slicing is only supported on tensors",
            )),
        }
    }
}

impl ForeignProxy for GenericProxy {
    fn handle(&self) -> &Handle {
        &self.handle
    }

    fn get(&self, name: &str) -> Result<Value> {
        self.get_member(name)
    }

    fn set(&self, name: &str, value: Value) -> Result<()> {
        let value = encode(value, self.library.blob_host())?;
        Ok(self.handle.set(name, value)?)
    }

    fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        let args = if self.reads_media {
            self.encode_read_args(args, kwargs)?
        } else {
            self.encode_args(args, kwargs)?
        };

        let res = if self.handle.has("_call")? {
            debug!(handle = ?self.handle, "Dispatching through _call");
            self.handle.call_method("_call", args)?
        } else if self.is_class {
            debug!(handle = ?self.handle, "Constructing class");
            self.handle.construct(args)?
        } else {
            match &self.receiver {
                Some(receiver) => self.handle.call_with(receiver, args)?,
                None => self.handle.call(args)?,
            }
        };

        self.library.decode(res)
    }

    fn index(&self, key: Index) -> Result<Value> {
        let name = Self::key_name(key)?;
        self.get_member(&name)
    }

    fn set_item(&self, key: Index, value: Value) -> Result<()> {
        let name = Self::key_name(key)?;
        self.set(&name, value)
    }
}

impl fmt::Debug for GenericProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenericProxy({:?})", self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use std::sync::{Arc, Mutex};
    use tjs_handle::memory::MemoryRuntime;
    use tjs_handle::HandleError;

    fn library(rt: &MemoryRuntime) -> Library {
        Library::new(rt.object()).with_blob_host(Arc::new(rt.clone()))
    }

    #[test]
    fn class_heuristic_matches_class_source() {
        let rt = MemoryRuntime::new();
        let class = rt.class("Pipeline", |_| Ok(ForeignValue::Undefined));
        let indented = rt.class_with_source("  class Foo_1 {}", |_| Ok(ForeignValue::Undefined));
        let func = rt.function("pipeline", |_| Ok(ForeignValue::Undefined));
        let arrow = rt.function_with_source("() => class A {}", |_| Ok(ForeignValue::Undefined));

        assert!(looks_like_class(&class).unwrap());
        assert!(looks_like_class(&indented).unwrap());
        assert!(!looks_like_class(&func).unwrap());
        assert!(!looks_like_class(&arrow).unwrap());
        assert!(!looks_like_class(&rt.object()).unwrap());
    }

    #[test]
    fn call_prefers_underscore_call() {
        let rt = MemoryRuntime::new();
        let class = rt.class("Pipeline", |_| Ok(ForeignValue::Undefined));
        rt.define_method(&class, "_call", |ctx| {
            Ok(ForeignValue::from(format!("_call({})", ctx.args.len())))
        })
        .unwrap();
        let instance = class.construct(vec![]).unwrap().into_handle().unwrap();

        let proxy = GenericProxy::new(instance, library(&rt)).unwrap();
        let res = proxy
            .call(vec![Value::from("a")], btree! { "topk".to_string() => Value::from(1i64) })
            .unwrap();
        assert_eq!(res, Value::from("_call(2)"));
    }

    #[test]
    fn call_constructs_classes() {
        let rt = MemoryRuntime::new();
        let class = rt.class("Tokenizer", |ctx| {
            if let Some(this) = &ctx.this {
                this.set("name", ctx.arg(0))?;
            }
            Ok(ForeignValue::Undefined)
        });
        let proxy = GenericProxy::new(class, library(&rt)).unwrap();
        assert!(proxy.is_class());

        let instance = proxy.call(vec![Value::from("bert")], Kwargs::new()).unwrap();
        let instance = instance.into_proxy().unwrap();
        assert_eq!(instance.get("name").unwrap(), Value::from("bert"));
    }

    #[test]
    fn plain_functions_are_called() {
        let rt = MemoryRuntime::new();
        let add = rt.function("add", |ctx| {
            let sum = ctx.args.iter().filter_map(ForeignValue::as_f64).sum::<f64>();
            Ok(ForeignValue::Number(sum))
        });
        let proxy = GenericProxy::new(add, library(&rt)).unwrap();
        assert!(!proxy.is_class());
        let res = proxy
            .call(vec![Value::from(1i64), Value::from(2.5)], Kwargs::new())
            .unwrap();
        assert_eq!(res, Value::Float(3.5));
    }

    #[test]
    fn methods_keep_their_receiver() {
        let rt = MemoryRuntime::new();
        let obj = rt.object();
        obj.set("size", ForeignValue::Integer(640)).unwrap();
        obj.set(
            "getSize",
            rt.function("getSize", |ctx| match ctx.this {
                Some(this) => this.get("size"),
                None => Err(HandleError::thrown("TypeError", "this is undefined")),
            })
            .into(),
        )
        .unwrap();

        let proxy = GenericProxy::new(obj, library(&rt)).unwrap();
        let method = proxy.get("getSize").unwrap().into_proxy().unwrap();
        assert_eq!(method.call(vec![], Kwargs::new()).unwrap(), Value::Integer(640));
        assert_eq!(
            proxy.call_method("getSize", vec![], Kwargs::new()).unwrap(),
            Value::Integer(640)
        );
    }

    #[test]
    fn set_writes_through() {
        let rt = MemoryRuntime::new();
        let size = rt.object();
        let extractor = rt.object_from(vec![("size", size.into())]);
        let proxy = GenericProxy::new(extractor.clone(), library(&rt)).unwrap();

        proxy
            .set(
                "size",
                Value::Map(btree! {
                    "width".to_string() => Value::from(256i64),
                    "height".to_string() => Value::from(256i64),
                }),
            )
            .unwrap();

        let written = extractor.get("size").unwrap().into_handle().unwrap();
        assert_eq!(written.get("width").unwrap(), ForeignValue::Integer(256));
        assert_eq!(written.get("height").unwrap(), ForeignValue::Integer(256));
    }

    #[test]
    fn index_reads_names_and_positions() {
        let rt = MemoryRuntime::new();
        let arr = rt.array(vec![ForeignValue::from("a"), ForeignValue::from("b")]);
        let proxy = GenericProxy::new(arr, library(&rt)).unwrap();
        assert_eq!(proxy.index(Index::Position(1)).unwrap(), Value::from("b"));
        assert_eq!(proxy.index("length".into()).unwrap(), Value::Integer(2));

        proxy.set_item(Index::Position(0), Value::from("z")).unwrap();
        assert_eq!(proxy.index(Index::Position(0)).unwrap(), Value::from("z"));
    }

    #[test]
    fn slicing_generic_proxy_is_rejected() {
        let rt = MemoryRuntime::new();
        let proxy = GenericProxy::new(rt.object(), library(&rt)).unwrap();
        let err = proxy
            .index(Index::Slice(crate::proxy::Slice::new(0, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::Precondition { .. }));
    }

    #[test]
    fn keys_list_own_members() {
        let rt = MemoryRuntime::new();
        let obj = rt.object_from(vec![("a", 1i64.into()), ("b", 2i64.into())]);
        let proxy = GenericProxy::new(obj, library(&rt)).unwrap();
        assert_eq!(proxy.keys().unwrap(), vec!["a", "b"]);
        assert_eq!(proxy.len().unwrap(), 2);
        assert!(!proxy.is_empty().unwrap());
        assert_eq!(proxy.iter().unwrap().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn foreign_errors_surface_unchanged() {
        let rt = MemoryRuntime::new();
        let fail = rt.function("fail", |_| Err(HandleError::thrown("RangeError", "bad topk")));
        let proxy = GenericProxy::new(fail, library(&rt)).unwrap();
        let err = proxy.call(vec![], Kwargs::new()).unwrap_err();
        assert_eq!(err.to_string(), "RangeError: bad topk");
    }

    #[test]
    fn image_arguments_cross_as_blob_urls() {
        let rt = MemoryRuntime::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let f = rt.function("classify", move |ctx| {
            *sink.lock().unwrap() = ctx.arg(0).as_str().map(str::to_string);
            Ok(ForeignValue::Undefined)
        });
        let proxy = GenericProxy::new(f, library(&rt)).unwrap();
        let image = tjs_media::LocalImage::new(1, 1, 1, vec![7]).unwrap();

        let res = proxy.call(vec![Value::Image(image)], Kwargs::new());
        if cfg!(feature = "image") {
            res.unwrap();
            let url = seen.lock().unwrap().clone().unwrap();
            assert!(rt.blob(&url).is_some());
        } else {
            assert!(matches!(res, Err(Error::Unavailable { .. })));
        }
    }
}
