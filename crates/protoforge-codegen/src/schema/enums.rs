use super::extract::{OutputPaths, flatten_enums, raw_enum_name};
use super::{Enum, EnumValue, SchemaContext};
use crate::directive::{DirectiveBlock, as_line_comments};
use protoforge_idl::ProtoFile;

impl SchemaContext {
    pub(super) fn build_enums(&self, file: &ProtoFile, dir: &str) -> Vec<Enum> {
        flatten_enums(file)
            .into_iter()
            .map(|decl| {
                let raw_name = raw_enum_name(&decl.name);
                let paths = OutputPaths::new(&self.base_package, "enums", dir, raw_name);
                let block = DirectiveBlock::from_comments(&decl.comments);
                Enum {
                    name: decl.name.clone(),
                    raw_name: raw_name.to_string(),
                    package: paths.package,
                    import_path: paths.import_path,
                    file_path: paths.file_path,
                    comments: as_line_comments(block.doc_lines()),
                    values: decl
                        .values
                        .iter()
                        .map(|value| {
                            let block = DirectiveBlock::from_comments(&value.comments);
                            EnumValue {
                                name: value.name.clone(),
                                value: value.number,
                                message: block.value_or("msg", &value.name),
                                comments: as_line_comments(block.doc_lines()),
                            }
                        })
                        .collect(),
                }
            })
            .collect()
    }
}
