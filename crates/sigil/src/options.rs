use sigil_archive::lookup_key;
use sigil_blockmap::ParseOptions;
use sigil_signature::VerifyLimits;

pub const BLOCK_MAP_ENTRY: &str = "BlockMap.json";
pub const SIGNATURE_ENTRY: &str = "Signature.sig";
pub const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";

/// How much of the trust chain is checked when a package is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Validation {
    /// Verify the signature over the block map, then parse it.
    #[default]
    Full,
    /// Parse the block map without checking its signature.
    SkipSignature,
}

/// Options for opening a package.
#[derive(Clone, Debug)]
pub struct PackageOptions {
    pub validation:       Validation,
    /// Refuse raw reads of block-mapped files.
    pub validate_content: bool,
    pub block_map_entry:  String,
    pub signature_entry:  String,
    /// Extra entries allowed to sit outside the block map.
    pub footprint:        Vec<String>,
    pub parse:            ParseOptions,
    pub limits:           VerifyLimits,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            validation:       Validation::Full,
            validate_content: true,
            block_map_entry:  BLOCK_MAP_ENTRY.to_string(),
            signature_entry:  SIGNATURE_ENTRY.to_string(),
            footprint:        Vec::new(),
            parse:            ParseOptions::default(),
            limits:           VerifyLimits::default(),
        }
    }
}

impl PackageOptions {
    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn validate_content(mut self, validate: bool) -> Self {
        self.validate_content = validate;
        self
    }

    pub fn block_map_entry(mut self, name: impl Into<String>) -> Self {
        self.block_map_entry = name.into();
        self
    }

    pub fn signature_entry(mut self, name: impl Into<String>) -> Self {
        self.signature_entry = name.into();
        self
    }

    pub fn footprint_entry(mut self, name: impl Into<String>) -> Self {
        self.footprint.push(name.into());
        self
    }

    pub fn parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn verify_limits(mut self, limits: VerifyLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether `path` is package metadata rather than content.
    pub fn is_footprint(&self, path: &str) -> bool {
        let key = lookup_key(path);
        [self.block_map_entry.as_str(), self.signature_entry.as_str(), CONTENT_TYPES_ENTRY]
            .into_iter()
            .chain(self.footprint.iter().map(String::as_str))
            .any(|name| lookup_key(name) == key)
    }
}
