//! Protobuf descriptors for server reflection.
//!
//! Mirrors the messages in [`super::proto`] field for field; a tag changed
//! there has to be changed here as well.
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};

pub const PACKAGE: &str = "dictybase.content.v1";
pub const SERVICE: &str = "ContentService";

const CONTENT_FILE: &str = "dictybase/content/v1/content.proto";
const TIMESTAMP_FILE: &str = "google/protobuf/timestamp.proto";
const TIMESTAMP: &str = ".google.protobuf.Timestamp";

fn field(name: &str, number: i32, kind: Type, type_name: Option<String>) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        type_name,
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

fn string(name: &str, number: i32) -> FieldDescriptorProto {
    field(name, number, Type::String, None)
}

fn int64(name: &str, number: i32) -> FieldDescriptorProto {
    field(name, number, Type::Int64, None)
}

fn message(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    let type_name = if type_name.starts_with('.') {
        type_name.to_string()
    } else {
        format!(".{PACKAGE}.{type_name}")
    };
    field(name, number, Type::Message, Some(type_name))
}

fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn message_type(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(format!(".{PACKAGE}.{input}")),
        output_type: Some(format!(".{PACKAGE}.{output}")),
        ..Default::default()
    }
}

fn timestamp_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(TIMESTAMP_FILE.to_string()),
        package: Some("google.protobuf".to_string()),
        message_type: vec![message_type(
            "Timestamp",
            vec![
                int64("seconds", 1),
                field("nanos", 2, Type::Int32, None),
            ],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn content_file() -> FileDescriptorProto {
    let messages = vec![
        message_type("Empty", Vec::new()),
        message_type("HealthzIdRequest", vec![int64("id", 1)]),
        message_type("ContentIdRequest", vec![int64("id", 1)]),
        message_type("ContentRequest", vec![string("slug", 1)]),
        message_type("Links", vec![string("self", 1)]),
        message_type(
            "ContentAttributes",
            vec![
                string("name", 1),
                string("namespace", 2),
                string("slug", 3),
                string("content", 4),
                string("created_by", 5),
                string("updated_by", 6),
                message("created_at", 7, TIMESTAMP),
                message("updated_at", 8, TIMESTAMP),
            ],
        ),
        message_type(
            "ContentData",
            vec![
                string("type", 1),
                int64("id", 2),
                message("attributes", 3, "ContentAttributes"),
                message("links", 4, "Links"),
            ],
        ),
        message_type(
            "Content",
            vec![message("data", 1, "ContentData"), message("links", 2, "Links")],
        ),
        message_type(
            "NewContentAttributes",
            vec![
                string("name", 1),
                string("namespace", 2),
                string("created_by", 3),
                string("content", 4),
            ],
        ),
        message_type(
            "StoreContentData",
            vec![
                string("type", 1),
                message("attributes", 2, "NewContentAttributes"),
            ],
        ),
        message_type(
            "StoreContentRequest",
            vec![message("data", 1, "StoreContentData")],
        ),
        message_type(
            "ExistingContentAttributes",
            vec![string("updated_by", 1), string("content", 2)],
        ),
        message_type(
            "UpdateContentData",
            vec![
                string("type", 1),
                int64("id", 2),
                message("attributes", 3, "ExistingContentAttributes"),
            ],
        ),
        message_type(
            "UpdateContentRequest",
            vec![int64("id", 1), message("data", 2, "UpdateContentData")],
        ),
    ];
    let service = ServiceDescriptorProto {
        name: Some(SERVICE.to_string()),
        method: vec![
            method("Healthz", "HealthzIdRequest", "Empty"),
            method("GetContentBySlug", "ContentRequest", "Content"),
            method("GetContent", "ContentIdRequest", "Content"),
            method("StoreContent", "StoreContentRequest", "Content"),
            method("UpdateContent", "UpdateContentRequest", "Content"),
            method("DeleteContent", "ContentIdRequest", "Empty"),
        ],
        ..Default::default()
    };
    FileDescriptorProto {
        name: Some(CONTENT_FILE.to_string()),
        package: Some(PACKAGE.to_string()),
        dependency: vec![TIMESTAMP_FILE.to_string()],
        message_type: messages,
        service: vec![service],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

/// Descriptor set covering the content service and its timestamp dependency.
pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![timestamp_file(), content_file()],
    }
}
