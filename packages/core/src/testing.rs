//! A stand-in for the wrapped library, built on the in-memory runtime.
//!
//! Mirrors the parts of the library's surface the bridge treats specially:
//! `RawImage` (with static `read` / `fromURL`), `Tensor` (with `slice`),
//! `pipeline` returning a `_call`-able pipeline, and `env`.

use std::sync::Arc;

use bytes::Bytes;
use tjs_handle::memory::{CallContext, MemoryRuntime};
use tjs_handle::{ForeignValue, Handle, HandleError, Pending, TypedArray};

use crate::Library;

/// Handles into a fake library namespace.
pub struct FakeTransformers {
    pub namespace: Handle,
    pub env: Handle,
    pub raw_image: Handle,
    pub tensor: Handle,
    pub pipeline_class: Handle,
}

impl FakeTransformers {
    /// A library over this namespace, with `rt` as blob host.
    pub fn library(&self, rt: &MemoryRuntime) -> Library {
        Library::new(self.namespace.clone()).with_blob_host(Arc::new(rt.clone()))
    }
}

fn type_error(message: &str) -> HandleError {
    HandleError::thrown("TypeError", message)
}

fn receiver(ctx: &CallContext) -> Result<Handle, HandleError> {
    ctx.this
        .clone()
        .ok_or_else(|| type_error("called without a receiver"))
}

fn sizes(value: ForeignValue) -> Result<Vec<usize>, HandleError> {
    let value = match value {
        ForeignValue::Handle(h) => h.materialize()?,
        other => other,
    };
    match value {
        ForeignValue::Array(items) => items
            .iter()
            .map(|d| d.as_usize().ok_or_else(|| type_error("dims must be sizes")))
            .collect(),
        _ => Err(type_error("dims must be an array")),
    }
}

fn typed_from_numbers(ty: &str, items: &[ForeignValue]) -> Result<TypedArray, HandleError> {
    let numbers: Vec<f64> = items
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| type_error("tensor data must be numeric")))
        .collect::<Result<_, _>>()?;
    Ok(match ty {
        "float32" => TypedArray::from_slice(&numbers.iter().map(|&n| n as f32).collect::<Vec<_>>()),
        "float64" => TypedArray::from_slice(&numbers),
        "int32" => TypedArray::from_slice(&numbers.iter().map(|&n| n as i32).collect::<Vec<_>>()),
        "int64" => TypedArray::from_slice(&numbers.iter().map(|&n| n as i64).collect::<Vec<_>>()),
        _ => return Err(type_error("unsupported tensor type")),
    })
}

fn tensor_init(ctx: CallContext) -> Result<ForeignValue, HandleError> {
    let this = receiver(&ctx)?;
    match ctx.args.as_slice() {
        [ForeignValue::String(ty), data, ForeignValue::Array(dims)] => {
            let data = match data {
                ForeignValue::Typed(t) => t.clone(),
                ForeignValue::Array(items) => typed_from_numbers(ty, items)?,
                _ => return Err(type_error("unsupported tensor data")),
            };
            this.set("type", ty.as_str().into())?;
            this.set("data", ForeignValue::Typed(data))?;
            this.set("dims", ForeignValue::Array(dims.clone()))?;
        }
        [ForeignValue::Typed(data)] => {
            this.set("type", data.element_type.name().into())?;
            this.set("dims", ForeignValue::Array(vec![(data.len() as i64).into()]))?;
            this.set("data", ForeignValue::Typed(data.clone()))?;
        }
        _ => return Err(type_error("unsupported tensor arguments")),
    }
    Ok(ForeignValue::Undefined)
}

/// `Tensor.prototype.slice(...slices)`: an integer selects and drops an
/// axis, `[start, stop]` keeps a range, missing trailing axes are kept whole.
fn tensor_slice(ctx: CallContext) -> Result<ForeignValue, HandleError> {
    let this = receiver(&ctx)?;
    let dims = sizes(this.get("dims")?)?;
    let data = match this.get("data")? {
        ForeignValue::Typed(t) => t,
        _ => return Err(type_error("tensor data must be a typed array")),
    };
    let size = data.element_type.size();

    let mut ranges = Vec::with_capacity(dims.len());
    let mut new_dims = Vec::new();
    for (axis, &dim) in dims.iter().enumerate() {
        match ctx.args.get(axis) {
            None | Some(ForeignValue::Undefined) => {
                ranges.push((0, dim));
                new_dims.push(dim as i64);
            }
            Some(ForeignValue::Integer(i)) => {
                let i = if *i < 0 { *i + dim as i64 } else { *i };
                if i < 0 || i as usize >= dim {
                    return Err(HandleError::thrown("RangeError", "index out of range"));
                }
                ranges.push((i as usize, i as usize + 1));
            }
            Some(ForeignValue::Array(bounds)) => {
                let start = bounds.first().and_then(ForeignValue::as_usize).unwrap_or(0);
                let stop = bounds
                    .get(1)
                    .and_then(ForeignValue::as_usize)
                    .unwrap_or(dim)
                    .min(dim);
                let start = start.min(stop);
                ranges.push((start, stop));
                new_dims.push((stop - start) as i64);
            }
            Some(_) => return Err(type_error("invalid slice")),
        }
    }

    let mut strides = vec![1usize; dims.len()];
    for k in (0..dims.len().saturating_sub(1)).rev() {
        strides[k] = strides[k + 1] * dims[k + 1];
    }

    let mut out = Vec::new();
    if ranges.iter().all(|(start, stop)| start < stop) {
        let mut index: Vec<usize> = ranges.iter().map(|r| r.0).collect();
        'outer: loop {
            let offset: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
            out.extend_from_slice(&data.data[offset * size..(offset + 1) * size]);

            let mut k = index.len();
            loop {
                if k == 0 {
                    break 'outer;
                }
                k -= 1;
                index[k] += 1;
                if index[k] < ranges[k].1 {
                    break;
                }
                index[k] = ranges[k].0;
            }
        }
    }

    let class = this
        .get("constructor")?
        .into_handle()
        .ok_or_else(|| type_error("tensor without constructor"))?;
    class.construct(vec![
        data.element_type.name().into(),
        ForeignValue::Typed(TypedArray::new(data.element_type, Bytes::from(out))),
        ForeignValue::Array(new_dims.into_iter().map(ForeignValue::Integer).collect()),
    ])
}

fn raw_image_init(ctx: CallContext) -> Result<ForeignValue, HandleError> {
    let this = receiver(&ctx)?;
    this.set("data", ctx.arg(0))?;
    this.set("width", ctx.arg(1))?;
    this.set("height", ctx.arg(2))?;
    this.set("channels", ctx.arg(3))?;
    Ok(ForeignValue::Undefined)
}

/// Static `RawImage.read` / `RawImage.fromURL`: a 2x1 RGB image that
/// remembers what it was read from.
fn raw_image_read(ctx: CallContext) -> Result<ForeignValue, HandleError> {
    let class = receiver(&ctx)?;
    let image = class.construct(vec![
        ForeignValue::Bytes(Bytes::from_static(&[255, 0, 0, 0, 0, 255])),
        ForeignValue::Integer(2),
        ForeignValue::Integer(1),
        ForeignValue::Integer(3),
    ])?;
    if let Some(h) = image.as_handle() {
        h.set("source", ctx.arg(0))?;
    }
    Ok(ForeignValue::Pending(Pending::ready(Ok(image))))
}

/// Build a fake library namespace reporting `version`.
pub fn fake_transformers(rt: &MemoryRuntime, version: &str) -> FakeTransformers {
    let env = rt.object_from(vec![
        ("version", version.into()),
        ("allowLocalModels", true.into()),
    ]);

    let tensor = rt.class("Tensor", tensor_init);
    let _ = rt.define_method(&tensor, "slice", tensor_slice);

    let raw_image = rt.class("RawImage", raw_image_init);
    let _ = raw_image.set("read", rt.function("read", raw_image_read).into());
    let _ = raw_image.set("fromURL", rt.function("fromURL", raw_image_read).into());

    let pipeline_class = rt.class("TextClassificationPipeline", |ctx| {
        let this = receiver(&ctx)?;
        this.set("task", ctx.arg(0))?;
        this.set("model", ctx.arg(1))?;
        Ok(ForeignValue::Undefined)
    });
    let _ = rt.define_method(&pipeline_class, "_call", |ctx| {
        let result = ForeignValue::Array(vec![ForeignValue::Object(vec![
            ("label".to_string(), "POSITIVE".into()),
            ("score".to_string(), ForeignValue::Number(0.99)),
            ("input".to_string(), ctx.arg(0)),
        ])]);
        Ok(ForeignValue::Pending(Pending::ready(Ok(result))))
    });

    let class = pipeline_class.clone();
    let pipeline = rt.function("pipeline", move |ctx| {
        let instance = class.construct(vec![ctx.arg(0), ctx.arg(1)])?;
        Ok(ForeignValue::Pending(Pending::ready(Ok(instance))))
    });

    let namespace = rt.object_from(vec![
        ("env", env.clone().into()),
        ("pipeline", pipeline.into()),
        ("RawImage", raw_image.clone().into()),
        ("Tensor", tensor.clone().into()),
        ("TextClassificationPipeline", pipeline_class.clone().into()),
    ]);

    FakeTransformers {
        namespace,
        env,
        raw_image,
        tensor,
        pipeline_class,
    }
}

