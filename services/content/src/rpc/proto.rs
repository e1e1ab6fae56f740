//! Wire messages of the `dictybase.content.v1` package.
//!
//! Declared by hand with `prost` derives so the build needs no `protoc`. Field
//! tags are part of the wire contract and must not be renumbered.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthzIdRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContentIdRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContentRequest {
    #[prost(string, tag = "1")]
    pub slug: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Links {
    #[prost(string, tag = "1")]
    pub self_link: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContentAttributes {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub namespace: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub slug: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub content: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub created_by: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub updated_by: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "7")]
    pub created_at: ::core::option::Option<::prost_types::Timestamp>,
    #[prost(message, optional, tag = "8")]
    pub updated_at: ::core::option::Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContentData {
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub id: i64,
    #[prost(message, optional, tag = "3")]
    pub attributes: ::core::option::Option<ContentAttributes>,
    #[prost(message, optional, tag = "4")]
    pub links: ::core::option::Option<Links>,
}

/// A content resource, as returned by every read/write method and published
/// on the bus.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Content {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<ContentData>,
    #[prost(message, optional, tag = "2")]
    pub links: ::core::option::Option<Links>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NewContentAttributes {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub namespace: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub created_by: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub content: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StoreContentData {
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub attributes: ::core::option::Option<NewContentAttributes>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StoreContentRequest {
    #[prost(message, optional, tag = "1")]
    pub data: ::core::option::Option<StoreContentData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExistingContentAttributes {
    #[prost(string, tag = "1")]
    pub updated_by: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub content: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateContentData {
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub id: i64,
    #[prost(message, optional, tag = "3")]
    pub attributes: ::core::option::Option<ExistingContentAttributes>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateContentRequest {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(message, optional, tag = "2")]
    pub data: ::core::option::Option<UpdateContentData>,
}
