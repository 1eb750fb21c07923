//! Known LuaRocks packages and environment profiles.

/// A package the curator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    /// LuaRocks rock name.
    pub name: &'static str,
    /// Module name passed to `require`.
    pub module: &'static str,
    /// Grouping label.
    pub category: &'static str,
    /// Higher is more important (1-10).
    pub priority: u8,
    /// One-line description.
    pub description: &'static str,
}

/// A named package set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    /// Profile name.
    pub name: &'static str,
    /// Grouping label.
    pub category: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Rocks installed by the profile.
    pub packages: &'static [&'static str],
}

/// Packages offered by "Install recommended packages".
pub const RECOMMENDED: [&str; 3] = ["luasocket", "luafilesystem", "lua-cjson"];

const fn pkg(
    name: &'static str,
    module: &'static str,
    category: &'static str,
    priority: u8,
    description: &'static str,
) -> Package {
    Package {
        name,
        module,
        category,
        priority,
        description,
    }
}

/// Every package in the catalog.
pub static PACKAGES: &[Package] = &[
    // Core
    pkg("lua-cjson", "cjson", "core", 10, "Fast JSON parsing and encoding"),
    pkg("luafilesystem", "lfs", "core", 9, "File system operations"),
    pkg("luasocket", "socket", "core", 9, "Network support for Lua"),
    pkg("penlight", "pl", "core", 7, "General-purpose utility libraries"),
    pkg("luaposix", "posix", "system", 6, "POSIX system interface"),
    // Extended
    pkg("lpeg", "lpeg", "parsing", 6, "Pattern-matching library"),
    pkg("lua-curl", "cURL", "network", 5, "HTTP client functionality"),
    pkg("lua-messagepack", "MessagePack", "serialization", 5, "MessagePack serialization"),
    pkg("lua-yaml", "yaml", "serialization", 4, "YAML parsing and generation"),
    pkg("lua-term", "term", "terminal", 4, "Terminal control and ANSI colors"),
    // BioXen
    pkg("bio-utils", "bio-utils", "biology", 9, "Essential biological data processing utilities"),
    pkg("sequence-parser", "sequence-parser", "biology", 8, "DNA/RNA/protein sequence parsing and analysis"),
    pkg("phylo-tree", "phylo-tree", "biology", 7, "Phylogenetic tree construction and analysis"),
    pkg("blast-parser", "blast-parser", "biology", 6, "BLAST output parsing and analysis"),
    pkg("genome-tools", "genome-tools", "biology", 7, "Genome assembly and annotation tools"),
    pkg("protein-fold", "protein-fold", "biology", 5, "Protein structure prediction utilities"),
    pkg("gabby-lua", "gabby-lua", "ai", 8, "AI conversational interface for Lua environments"),
    pkg("lua-radio", "lua-radio", "radio", 7, "Software defined radio functionality for Lua"),
];

/// Every environment profile in the catalog.
pub static PROFILES: &[Profile] = &[
    Profile {
        name: "minimal",
        category: "general",
        description: "Minimal Lua environment with basic utilities",
        packages: &["lua-cjson", "luafilesystem"],
    },
    Profile {
        name: "standard",
        category: "general",
        description: "Standard Lua environment with common utilities",
        packages: &["lua-cjson", "luafilesystem", "luasocket", "penlight"],
    },
    Profile {
        name: "full",
        category: "general",
        description: "Full-featured Lua environment with extensive library support",
        packages: &[
            "lua-cjson",
            "luafilesystem",
            "luasocket",
            "penlight",
            "lpeg",
            "lua-curl",
            "lua-messagepack",
            "lua-yaml",
            "lua-term",
            "luaposix",
        ],
    },
    Profile {
        name: "network",
        category: "networking",
        description: "Network-focused environment for distributed applications",
        packages: &[
            "lua-cjson",
            "luafilesystem",
            "luasocket",
            "lua-curl",
            "lua-messagepack",
            "penlight",
        ],
    },
    Profile {
        name: "development",
        category: "development",
        description: "Development environment with debugging and system tools",
        packages: &[
            "lua-cjson",
            "luafilesystem",
            "luasocket",
            "penlight",
            "lpeg",
            "lua-term",
            "luaposix",
        ],
    },
    Profile {
        name: "bioxen-minimal",
        category: "biology",
        description: "Minimal BioXen environment with core biological tools",
        packages: &["lua-cjson", "luafilesystem", "bio-utils"],
    },
    Profile {
        name: "bioxen-standard",
        category: "biology",
        description: "Standard BioXen environment with common biological analysis tools",
        packages: &[
            "lua-cjson",
            "luafilesystem",
            "luasocket",
            "bio-utils",
            "sequence-parser",
            "phylo-tree",
            "gabby-lua",
        ],
    },
    Profile {
        name: "bioxen-full",
        category: "biology",
        description: "Full BioXen environment with all biological tools and SDR support",
        packages: &[
            "lua-cjson",
            "luafilesystem",
            "luasocket",
            "bio-utils",
            "sequence-parser",
            "phylo-tree",
            "blast-parser",
            "genome-tools",
            "protein-fold",
            "gabby-lua",
            "lua-radio",
            "penlight",
        ],
    },
    Profile {
        name: "bioxen-ai",
        category: "ai-biology",
        description: "AI-focused BioXen environment with conversational interface",
        packages: &[
            "lua-cjson",
            "luafilesystem",
            "luasocket",
            "gabby-lua",
            "bio-utils",
            "sequence-parser",
            "penlight",
        ],
    },
    Profile {
        name: "bioxen-radio",
        category: "radio",
        description: "Software-defined radio environment for communication protocols",
        packages: &[
            "lua-cjson",
            "luafilesystem",
            "luasocket",
            "lua-radio",
            "lua-messagepack",
            "penlight",
        ],
    },
];

/// Look up a package by rock name.
pub fn package(name: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|p| p.name == name)
}

/// Look up a profile by name.
pub fn profile(name: &str) -> Option<&'static Profile> {
    PROFILES.iter().find(|p| p.name == name)
}

/// Module name to `require` for a rock. Unknown rocks are assumed to share
/// their module's name.
pub fn module_name(package_name: &str) -> &str {
    package(package_name).map_or(package_name, |p| p.module)
}

/// Sorted, de-duplicated profile categories.
pub fn categories() -> Vec<&'static str> {
    let mut categories: Vec<_> = PROFILES.iter().map(|p| p.category).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

/// Profiles in `category`.
pub fn profiles_in(category: &str) -> impl Iterator<Item = &'static Profile> + '_ {
    PROFILES.iter().filter(move |p| p.category == category)
}
