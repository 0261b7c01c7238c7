use crate::types::TypeRef;

/// Declared metadata of one formal method parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParameterDecl {
    ty: TypeRef,
    discovered_name: Option<String>,
    binding: Option<String>,
}

impl ParameterDecl {
    /// Parameter of type `ty` with no name information.
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            discovered_name: None,
            binding: None,
        }
    }

    /// Attaches the name recovered from compiled metadata.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.discovered_name = Some(name.into());
        self
    }

    /// Attaches an explicit binding name.
    pub fn bound(mut self, name: impl Into<String>) -> Self {
        self.binding = Some(name.into());
        self
    }

    /// Declared type.
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Discovered name, if any.
    pub fn discovered_name(&self) -> Option<&str> {
        self.discovered_name.as_deref()
    }

    /// Explicit binding name, if any.
    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }
}

/// Declared signature of a repository method.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodSignature {
    name: String,
    parameters: Vec<ParameterDecl>,
    return_type: TypeRef,
    declared_query: Option<String>,
}

impl MethodSignature {
    /// Method `name` returning `return_type`, without parameters.
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type,
            declared_query: None,
        }
    }

    /// Attaches an explicitly declared query. Methods with a declared query
    /// are not derived from their name.
    pub fn with_declared_query(mut self, query: impl Into<String>) -> Self {
        self.declared_query = Some(query.into());
        self
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: ParameterDecl) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Formal parameters in declaration order.
    pub fn parameters(&self) -> &[ParameterDecl] {
        &self.parameters
    }

    /// Declared return type.
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// Explicitly declared query, if any.
    pub fn declared_query(&self) -> Option<&str> {
        self.declared_query.as_deref()
    }
}

/// Repository-level metadata shared by every method of a repository.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepositoryMetadata {
    repository: String,
    domain_type: String,
}

impl RepositoryMetadata {
    /// Metadata of `repository` managing `domain_type`.
    pub fn new(repository: impl Into<String>, domain_type: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            domain_type: domain_type.into(),
        }
    }

    /// Repository interface name.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Declared domain type.
    pub fn domain_type(&self) -> &str {
        &self.domain_type
    }

    /// Domain class returned by `method`: the component of its return type.
    pub fn returned_domain_type<'a>(&self, method: &'a MethodSignature) -> &'a TypeRef {
        method.return_type().component_type()
    }
}
