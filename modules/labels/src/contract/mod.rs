pub mod model;

pub use model::{
    FieldDefinition, FieldType, Label, LabelFilter, LabelLookup, LabelTemplate, NewLabel,
    NewLabelTemplate,
};
