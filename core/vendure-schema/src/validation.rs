//! GraphQL type-system validation of an assembled document.
//!
//! Every violation is collected before returning so a broken build reports
//! all of its problems at once.

use crate::directives::is_marker;
use crate::document::{
    BUILT_IN_SCALARS, SchemaDocument, TypeKind, TypeRef, named_type, root_type_names,
    type_definition_name, type_extension_name, type_ref_string,
};
use crate::error::{SchemaResult, ValidationError, ValidationErrors};
use crate::resolver::MergedResolvers;
use graphql_parser::schema::{
    Definition, Directive, DirectiveDefinition, DirectiveLocation, Field, InputValue, Type,
    TypeDefinition,
};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Where a directive may appear and which arguments it takes.
struct DirectiveSpec {
    locations: Vec<DirectiveLocation>,
    /// Argument name and whether it must be supplied.
    arguments: Vec<(String, bool)>,
    repeatable: bool,
}

impl DirectiveSpec {
    fn built_in(locations: &[DirectiveLocation], arguments: &[(&str, bool)]) -> Self {
        Self {
            locations: locations.to_vec(),
            arguments: arguments
                .iter()
                .map(|(name, required)| (name.to_string(), *required))
                .collect(),
            repeatable: false,
        }
    }

    fn declared(definition: &DirectiveDefinition<'static, String>) -> Self {
        Self {
            locations: definition.locations.clone(),
            arguments: definition
                .arguments
                .iter()
                .map(|arg| {
                    let required =
                        matches!(arg.value_type, Type::NonNullType(_)) && arg.default_value.is_none();
                    (arg.name.clone(), required)
                })
                .collect(),
            repeatable: definition.repeatable,
        }
    }
}

/// Directives every GraphQL server understands without a declaration.
fn built_in_directives() -> HashMap<String, DirectiveSpec> {
    use DirectiveLocation as L;
    let executable = [L::Field, L::FragmentSpread, L::InlineFragment];
    [
        (
            "deprecated",
            DirectiveSpec::built_in(
                &[L::FieldDefinition, L::ArgumentDefinition, L::InputFieldDefinition, L::EnumValue],
                &[("reason", false)],
            ),
        ),
        ("skip", DirectiveSpec::built_in(&executable, &[("if", true)])),
        ("include", DirectiveSpec::built_in(&executable, &[("if", true)])),
        ("specifiedBy", DirectiveSpec::built_in(&[L::Scalar], &[("url", true)])),
        ("oneOf", DirectiveSpec::built_in(&[L::InputObject], &[])),
    ]
    .into_iter()
    .map(|(name, spec)| (name.to_string(), spec))
    .collect()
}

/// Validates the document and checks that every resolver targets a field
/// that exists. Returns all violations together.
pub fn validate(document: &SchemaDocument, resolvers: &MergedResolvers) -> SchemaResult<()> {
    let mut validator = Validator::new(document);
    validator.check_definitions(document);
    validator.check_roots(document);
    validator.check_resolvers(resolvers);

    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors::new(validator.errors).into())
    }
}

struct Validator<'d> {
    types: IndexMap<&'d str, &'d TypeDefinition<'static, String>>,
    directives: HashMap<String, DirectiveSpec>,
    errors: Vec<ValidationError>,
}

impl<'d> Validator<'d> {
    fn new(document: &'d SchemaDocument) -> Self {
        let mut validator = Self {
            types: IndexMap::new(),
            directives: built_in_directives(),
            errors: Vec::new(),
        };
        for def in &document.definitions {
            match def {
                Definition::TypeDefinition(td) => {
                    let name = type_definition_name(td);
                    if validator.types.insert(name, td).is_some() {
                        validator.errors.push(ValidationError::DuplicateMember {
                            type_name: "schema".to_string(),
                            member: name.to_string(),
                        });
                    }
                }
                Definition::DirectiveDefinition(directive) => {
                    validator
                        .directives
                        .insert(directive.name.clone(), DirectiveSpec::declared(directive));
                }
                Definition::TypeExtension(ext) => {
                    validator.errors.push(ValidationError::UnmergedExtension {
                        type_name: type_extension_name(ext).to_string(),
                    });
                }
                Definition::SchemaDefinition(_) => {}
            }
        }
        // Usages are checked once every declaration is known.
        for def in &document.definitions {
            if let Definition::SchemaDefinition(schema) = def {
                validator.check_directives(
                    &schema.directives,
                    DirectiveLocation::Schema,
                    "the schema definition",
                );
            }
        }
        validator
    }

    fn kind_of(&self, name: &str) -> Option<TypeKind> {
        if BUILT_IN_SCALARS.contains(&name) {
            return Some(TypeKind::Scalar);
        }
        self.types.get(name).map(|td| TypeKind::of_definition(td))
    }

    fn check_definitions(&mut self, document: &'d SchemaDocument) {
        for def in &document.definitions {
            let Definition::TypeDefinition(td) = def else {
                continue;
            };
            let name = type_definition_name(td);
            match td {
                TypeDefinition::Scalar(scalar) => {
                    self.check_directives(
                        &scalar.directives,
                        DirectiveLocation::Scalar,
                        &format!("scalar '{name}'"),
                    );
                }
                TypeDefinition::Object(obj) => {
                    self.check_directives(
                        &obj.directives,
                        DirectiveLocation::Object,
                        &format!("type '{name}'"),
                    );
                    self.check_fields(name, TypeKind::Object, &obj.fields);
                    self.check_implements(name, &obj.implements_interfaces, &obj.fields);
                }
                TypeDefinition::Interface(iface) => {
                    self.check_directives(
                        &iface.directives,
                        DirectiveLocation::Interface,
                        &format!("interface '{name}'"),
                    );
                    self.check_fields(name, TypeKind::Interface, &iface.fields);
                }
                TypeDefinition::Union(union_type) => {
                    self.check_directives(
                        &union_type.directives,
                        DirectiveLocation::Union,
                        &format!("union '{name}'"),
                    );
                    if union_type.types.is_empty() {
                        self.errors.push(ValidationError::EmptyType {
                            type_name: name.to_string(),
                            kind: TypeKind::Union,
                        });
                    }
                    self.check_duplicates(name, union_type.types.iter().map(String::as_str));
                    for member in &union_type.types {
                        match self.kind_of(member) {
                            None => self.errors.push(ValidationError::UnknownType {
                                type_name: member.clone(),
                                referenced_by: format!("union '{name}'"),
                            }),
                            Some(TypeKind::Object) => {}
                            Some(_) => self.errors.push(ValidationError::UnionMemberNotObject {
                                union_name: name.to_string(),
                                member: member.clone(),
                            }),
                        }
                    }
                }
                TypeDefinition::Enum(enum_type) => {
                    self.check_directives(
                        &enum_type.directives,
                        DirectiveLocation::Enum,
                        &format!("enum '{name}'"),
                    );
                    if enum_type.values.is_empty() {
                        self.errors.push(ValidationError::EmptyType {
                            type_name: name.to_string(),
                            kind: TypeKind::Enum,
                        });
                    }
                    self.check_duplicates(name, enum_type.values.iter().map(|v| v.name.as_str()));
                    for value in &enum_type.values {
                        self.check_directives(
                            &value.directives,
                            DirectiveLocation::EnumValue,
                            &format!("enum value '{name}.{}'", value.name),
                        );
                    }
                }
                TypeDefinition::InputObject(input) => {
                    self.check_directives(
                        &input.directives,
                        DirectiveLocation::InputObject,
                        &format!("input '{name}'"),
                    );
                    if input.fields.is_empty() {
                        self.errors.push(ValidationError::EmptyType {
                            type_name: name.to_string(),
                            kind: TypeKind::InputObject,
                        });
                    }
                    self.check_duplicates(name, input.fields.iter().map(|f| f.name.as_str()));
                    for field in &input.fields {
                        self.check_input_value(
                            field,
                            DirectiveLocation::InputFieldDefinition,
                            &format!("input field '{name}.{}'", field.name),
                        );
                    }
                }
            }
        }
    }

    fn check_fields(&mut self, type_name: &str, kind: TypeKind, fields: &[Field<'static, String>]) {
        if fields.is_empty() {
            self.errors.push(ValidationError::EmptyType {
                type_name: type_name.to_string(),
                kind,
            });
        }
        self.check_duplicates(type_name, fields.iter().map(|f| f.name.as_str()));
        for field in fields {
            let location = format!("field '{type_name}.{}'", field.name);
            self.check_directives(&field.directives, DirectiveLocation::FieldDefinition, &location);
            let target = named_type(&field.field_type);
            match self.kind_of(target) {
                None => self.errors.push(ValidationError::UnknownType {
                    type_name: target.to_string(),
                    referenced_by: location.clone(),
                }),
                Some(kind) if !kind.is_output() => self.errors.push(ValidationError::NotOutputType {
                    type_name: target.to_string(),
                    referenced_by: location.clone(),
                }),
                Some(_) => {}
            }
            self.check_duplicates(
                &format!("{type_name}.{}", field.name),
                field.arguments.iter().map(|a| a.name.as_str()),
            );
            for arg in &field.arguments {
                self.check_input_value(
                    arg,
                    DirectiveLocation::ArgumentDefinition,
                    &format!("argument '{type_name}.{}({})'", field.name, arg.name),
                );
            }
        }
    }

    fn check_input_value(
        &mut self,
        value: &InputValue<'static, String>,
        at: DirectiveLocation,
        location: &str,
    ) {
        self.check_directives(&value.directives, at, location);
        let target = named_type(&value.value_type);
        match self.kind_of(target) {
            None => self.errors.push(ValidationError::UnknownType {
                type_name: target.to_string(),
                referenced_by: location.to_string(),
            }),
            Some(kind) if !kind.is_input() => self.errors.push(ValidationError::NotInputType {
                type_name: target.to_string(),
                kind,
                referenced_by: location.to_string(),
            }),
            Some(_) => {}
        }
    }

    fn check_implements(
        &mut self,
        type_name: &str,
        interfaces: &[String],
        fields: &[Field<'static, String>],
    ) {
        for interface in interfaces {
            let iface = match self.types.get(interface.as_str()).copied() {
                None => {
                    self.errors.push(ValidationError::UnknownInterface {
                        type_name: type_name.to_string(),
                        interface: interface.clone(),
                    });
                    continue;
                }
                Some(TypeDefinition::Interface(iface)) => iface,
                Some(other) => {
                    self.errors.push(ValidationError::NotAnInterface {
                        type_name: type_name.to_string(),
                        interface: interface.clone(),
                        kind: TypeKind::of_definition(other),
                    });
                    continue;
                }
            };
            for required in &iface.fields {
                match fields.iter().find(|f| f.name == required.name) {
                    None => self.errors.push(ValidationError::MissingInterfaceField {
                        type_name: type_name.to_string(),
                        interface: interface.clone(),
                        field: required.name.clone(),
                    }),
                    Some(field) if !self.is_subtype(&field.field_type, &required.field_type) => {
                        self.errors.push(ValidationError::InvalidInterfaceField {
                            type_name: type_name.to_string(),
                            interface: interface.clone(),
                            field: required.name.clone(),
                            expected: type_ref_string(&required.field_type),
                            found: type_ref_string(&field.field_type),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
    }

    /// Output-type covariance: `found` may be used where `expected` is declared.
    fn is_subtype(&self, found: &TypeRef, expected: &TypeRef) -> bool {
        match (found, expected) {
            (Type::NonNullType(f), Type::NonNullType(e)) => self.is_subtype(f, e),
            (_, Type::NonNullType(_)) => false,
            (Type::NonNullType(f), e) => self.is_subtype(f, e),
            (Type::ListType(f), Type::ListType(e)) => self.is_subtype(f, e),
            (Type::ListType(_), _) | (_, Type::ListType(_)) => false,
            (Type::NamedType(f), Type::NamedType(e)) => {
                if f == e {
                    return true;
                }
                match (self.types.get(f.as_str()), self.types.get(e.as_str())) {
                    (Some(TypeDefinition::Object(obj)), Some(TypeDefinition::Interface(_))) => {
                        obj.implements_interfaces.contains(e)
                    }
                    (Some(TypeDefinition::Object(_)), Some(TypeDefinition::Union(u))) => {
                        u.types.contains(f)
                    }
                    _ => false,
                }
            }
        }
    }

    fn check_directives(
        &mut self,
        directives: &[Directive<'static, String>],
        at: DirectiveLocation,
        location: &str,
    ) {
        let mut used = HashSet::new();
        for directive in directives {
            let name = directive.name.as_str();
            if is_marker(name) {
                self.errors.push(ValidationError::UnresolvedMarker {
                    directive: name.to_string(),
                    location: location.to_string(),
                });
                continue;
            }
            let Some(spec) = self.directives.get(name) else {
                self.errors.push(ValidationError::UnknownDirective {
                    directive: name.to_string(),
                    location: location.to_string(),
                });
                continue;
            };

            let mut found = Vec::new();
            if !spec.locations.contains(&at) {
                let allowed: Vec<&str> = spec.locations.iter().map(|l| l.as_str()).collect();
                found.push(ValidationError::MisplacedDirective {
                    directive: name.to_string(),
                    location: location.to_string(),
                    found: at.as_str().to_string(),
                    allowed: allowed.join(" | "),
                });
            }
            if !used.insert(name) && !spec.repeatable {
                found.push(ValidationError::RepeatedDirective {
                    directive: name.to_string(),
                    location: location.to_string(),
                });
            }
            for (argument, _) in &directive.arguments {
                if !spec.arguments.iter().any(|(declared, _)| declared == argument) {
                    found.push(ValidationError::UnknownDirectiveArgument {
                        directive: name.to_string(),
                        location: location.to_string(),
                        argument: argument.clone(),
                    });
                }
            }
            for (argument, required) in &spec.arguments {
                if *required && !directive.arguments.iter().any(|(given, _)| given == argument) {
                    found.push(ValidationError::MissingDirectiveArgument {
                        directive: name.to_string(),
                        location: location.to_string(),
                        argument: argument.clone(),
                    });
                }
            }
            self.errors.extend(found);
        }
    }

    fn check_duplicates<'a>(&mut self, type_name: &str, members: impl Iterator<Item = &'a str>) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for member in members {
            if !seen.insert(member) && reported.insert(member) {
                self.errors.push(ValidationError::DuplicateMember {
                    type_name: type_name.to_string(),
                    member: member.to_string(),
                });
            }
        }
    }

    fn check_roots(&mut self, document: &SchemaDocument) {
        let (query, mutation, subscription) = root_type_names(document);
        let roots = [
            ("query", Some(query)),
            ("mutation", mutation),
            ("subscription", subscription),
        ];
        for (operation, name) in roots {
            let Some(name) = name else {
                continue;
            };
            if !matches!(self.types.get(name.as_str()), Some(TypeDefinition::Object(_))) {
                self.errors.push(ValidationError::MissingRootType {
                    operation: operation.to_string(),
                    type_name: name,
                });
            }
        }
    }

    fn check_resolvers(&mut self, resolvers: &MergedResolvers) {
        for (key, registered) in resolvers {
            let has_field = match self.types.get(key.type_name.as_str()) {
                Some(TypeDefinition::Object(obj)) => {
                    obj.fields.iter().any(|f| f.name == key.field_name)
                }
                Some(TypeDefinition::Interface(iface)) => {
                    iface.fields.iter().any(|f| f.name == key.field_name)
                }
                _ => false,
            };
            if !has_field {
                self.errors.push(ValidationError::ResolverWithoutField {
                    type_name: key.type_name.clone(),
                    field_name: key.field_name.clone(),
                    origin: registered.origin.clone(),
                });
            }
        }
    }
}
