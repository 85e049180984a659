//! Operation builder and problem responses for REST modules.

pub mod operation_builder;
pub mod problem;

pub use operation_builder::{
    ensure_schema, BodySpec, Missing, OpenApiRegistry, OperationBuilder, OperationDoc,
    OperationSpec, ParamKind, ParamLocation, ParamSpec, Present, ResponseBody, ResponseSpec,
    SchemaList,
};
