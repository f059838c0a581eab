//! Ahead-of-time JSON codec generation.
//!
//! A [`SchemaModel`] lists the serializable types and the shapes callers want
//! to (de)serialize. A [`Session`] walks it once, building a write tree and a
//! read tree per shape, coalescing literal output, and emitting one routine per
//! distinct shape and direction. The resulting [`Codec`] dispatches each call
//! to its precompiled routines; no type inspection happens at call time.
//!
//! ```
//! use json_prebake::{GeneratorOptions, Property, SchemaModel, Session, TypeDecl, TypeShape, Record, Value};
//!
//! let mut model = SchemaModel::new()
//!     .with_type(
//!         TypeDecl::new("Person")
//!             .property(Property::new("Name", TypeShape::string()))
//!             .property(Property::new("Age", TypeShape::int())),
//!     )
//!     .unwrap();
//! model.invoke_both(TypeShape::object("Person"));
//!
//! let codec = Session::new(&model, GeneratorOptions::default()).run().codec;
//! let ada: Value = Record::new("Person").field(Value::str("Ada")).field(Value::Int(36)).into();
//! let text = codec.serialize(&TypeShape::object("Person"), &ada).unwrap();
//! assert_eq!(text, "{\n\"Name\": \"Ada\",\n\"Age\": 36\n}");
//! assert_eq!(codec.deserialize(&TypeShape::object("Person"), &text).unwrap(), ada);
//! ```
pub mod codec;
pub mod emit;
pub mod error;
pub mod exec;
pub mod ir;
pub mod listing;
pub mod lower;
pub mod optimize;
pub mod path_de;
pub mod runtime;
pub mod schema;
pub mod value;

pub use codec::{Codec, Diagnostic, Entry, Generation, GeneratorOptions, Session, Severity};
pub use error::{CodecError, LoadError, SchemaError};
pub use runtime::{Expected, ParseError};
pub use schema::file::{SchemaDocument, load_documents};
pub use schema::{CallSite, Direction, Primitive, Property, SchemaModel, TypeDecl, TypeShape};
pub use value::{FieldReader, Record, Shaped, Value};
