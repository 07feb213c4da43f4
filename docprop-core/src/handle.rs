//! Deferred references to out-of-band payloads.
//!
//! Embedded pictures, OLE streams and similar payloads are often large and
//! mostly uninspected; a handle keeps only a reference into the backing
//! container. Nothing is read at construction - the first (and only the
//! first requested) access touches the store. A document with hundreds of
//! embedded objects costs nothing for the passes that skip them.

use std::any::Any;
use std::fmt;
use std::io::Read;
use std::rc::Rc;

/// Error returned when a deferred handle's backing store fails.
///
/// Only ever produced at access time, never during the parse, and only
/// surfaced to the consumer that asked for the payload.
#[derive(Debug)]
pub struct HandleError {
    pub message: String,
    pub resource: String,
}

impl HandleError {
    pub fn new(resource: impl Into<String>, message: impl Into<String>) -> Self {
        HandleError {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (resource: {})", self.message, self.resource)
    }
}

impl std::error::Error for HandleError {}

/// Backing store for a binary payload. Implemented by whatever container
/// layer owns the bytes (package part, compound storage, ...).
pub trait BinarySource {
    /// Name of the backing resource, for errors and logging.
    fn name(&self) -> &str;

    /// Materialize the payload. Called lazily, possibly never.
    fn read_all(&self) -> Result<Vec<u8>, HandleError>;
}

/// Backing store for a streamed payload.
pub trait StreamSource {
    fn name(&self) -> &str;

    /// Open a reader over the payload. Called lazily, possibly never.
    fn open(&self) -> Result<Box<dyn Read>, HandleError>;
}

/// Lazy reference to binary data held by a [`BinarySource`].
///
/// Cloning shares the source; a handle is a reference, not content.
#[derive(Clone)]
pub struct BinaryHandle {
    source: Rc<dyn BinarySource>,
}

impl BinaryHandle {
    pub fn new(source: Rc<dyn BinarySource>) -> Self {
        BinaryHandle { source }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Read the referenced bytes from the backing store.
    pub fn read_all(&self) -> Result<Vec<u8>, HandleError> {
        self.source.read_all()
    }
}

impl fmt::Debug for BinaryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryHandle")
            .field("name", &self.source.name())
            .finish()
    }
}

/// Lazy reference to a streamed payload held by a [`StreamSource`].
#[derive(Clone)]
pub struct StreamHandle {
    source: Rc<dyn StreamSource>,
}

impl StreamHandle {
    pub fn new(source: Rc<dyn StreamSource>) -> Self {
        StreamHandle { source }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Open a reader over the referenced payload.
    pub fn open(&self) -> Result<Box<dyn Read>, HandleError> {
        self.source.open()
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("name", &self.source.name())
            .finish()
    }
}

/// Opaque reference to a drawing-layer shape.
///
/// The engine never looks inside; the handle rides through the property
/// model until the builder that knows the drawing layer downcasts it.
#[derive(Clone)]
pub struct ShapeHandle {
    inner: Rc<dyn Any>,
}

impl ShapeHandle {
    pub fn new(inner: Rc<dyn Any>) -> Self {
        ShapeHandle { inner }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShapeHandle")
    }
}

/// Opaque reference to an embedded object (OLE, formula component, ...).
#[derive(Clone)]
pub struct ObjectHandle {
    inner: Rc<dyn Any>,
}

impl ObjectHandle {
    pub fn new(inner: Rc<dyn Any>) -> Self {
        ObjectHandle { inner }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectHandle")
    }
}
