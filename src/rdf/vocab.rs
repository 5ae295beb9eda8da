//! IRIs the sync engine matches on.

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

pub const LDP_CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";
pub const LDP_NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";

pub const PREMIS_HAS_SIZE: &str = "http://www.loc.gov/premis/rdf/v1#hasSize";
pub const PREMIS_HAS_MESSAGE_DIGEST: &str = "http://www.loc.gov/premis/rdf/v1#hasMessageDigest";

/// Namespace of server-managed repository properties and types.
pub const REPOSITORY_NAMESPACE: &str = "http://fedora.info/definitions/v4/repository#";

/// Subject suffix of the JCR/XML export pseudo-resource.
pub const JCR_XML_EXPORT_SUFFIX: &str = "fcr:export?format=jcr/xml";

/// Prefix of message digest IRIs carrying a SHA-1.
pub const SHA1_URN_PREFIX: &str = "urn:sha1:";
