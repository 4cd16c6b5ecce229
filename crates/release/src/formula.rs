//! Homebrew formula rendering.
//!
//! Rendering is pure: the same descriptor, version and assets always produce
//! byte-identical text, so re-publishing an unchanged release leaves a clean
//! diff in the tap.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Read-only description of the formula being published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaDescriptor {
    /// Formula name (e.g., "my-tool")
    pub name: String,
    /// One-line description
    pub desc: String,
    /// Homepage URL
    pub homepage: String,
    /// SPDX license identifier
    pub license: String,
    /// Name of the installed binary
    pub install_name: String,
}

impl FormulaDescriptor {
    /// Creates a descriptor whose install name equals the formula name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            install_name: name.clone(),
            name,
            desc: String::new(),
            homepage: String::new(),
            license: String::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Sets the homepage.
    #[must_use]
    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = homepage.into();
        self
    }

    /// Sets the license.
    #[must_use]
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    /// Sets the installed binary name.
    #[must_use]
    pub fn with_install_name(mut self, install_name: impl Into<String>) -> Self {
        self.install_name = install_name.into();
        self
    }

    /// Ruby class name: `my-tool` becomes `MyTool`.
    #[must_use]
    pub fn class_name(&self) -> String {
        self.name
            .split(['-', '_', '.'])
            .filter(|piece| !piece.is_empty())
            .map(|piece| {
                let mut chars = piece.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect()
                })
            })
            .collect()
    }

    /// File name of the formula in a tap: `<name>.rb`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.rb", self.name)
    }
}

/// Download location and checksum of one asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Download URL
    pub url: String,
    /// SHA-256 checksum
    pub sha256: String,
}

impl AssetRef {
    /// Creates a new asset reference.
    #[must_use]
    pub fn new(url: impl Into<String>, sha256: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sha256: sha256.into(),
        }
    }

    /// Both the URL and the hash are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.sha256.is_empty()
    }
}

/// Which template a formula uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaAssets {
    /// One top-level `url`/`sha256` pair.
    Single(AssetRef),
    /// Architecture-conditional pairs inside `on_macos`.
    Dual {
        /// Apple Silicon asset
        arm: AssetRef,
        /// Intel asset
        intel: AssetRef,
    },
}

impl FormulaAssets {
    /// Chooses the template from whichever pairs are complete.
    ///
    /// Both complete selects [`FormulaAssets::Dual`]; exactly one selects
    /// [`FormulaAssets::Single`] with it; none yields a single template with
    /// empty fields.
    #[must_use]
    pub fn select(arm: Option<&AssetRef>, intel: Option<&AssetRef>) -> Self {
        let arm = arm.filter(|a| a.is_complete());
        let intel = intel.filter(|a| a.is_complete());
        match (arm, intel) {
            (Some(arm), Some(intel)) => Self::Dual {
                arm: arm.clone(),
                intel: intel.clone(),
            },
            (Some(only), None) | (None, Some(only)) => Self::Single(only.clone()),
            (None, None) => Self::Single(AssetRef::default()),
        }
    }

    /// Whether every rendered pair is complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Single(asset) => asset.is_complete(),
            Self::Dual { arm, intel } => arm.is_complete() && intel.is_complete(),
        }
    }
}

impl fmt::Display for FormulaAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => write!(f, "single"),
            Self::Dual { .. } => write!(f, "dual"),
        }
    }
}

/// Escapes a value for a Ruby double-quoted string.
fn ruby_str(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("#{", "\\#{")
}

/// Renders Homebrew formula text.
pub struct FormulaGenerator;

impl FormulaGenerator {
    /// Renders a formula. `version` must already be free of a `v` prefix.
    #[must_use]
    #[allow(clippy::format_push_string)]
    pub fn generate(descriptor: &FormulaDescriptor, version: &str, assets: &FormulaAssets) -> String {
        let mut formula = format!(
            "class {} < Formula\n  desc \"{}\"\n  homepage \"{}\"\n",
            descriptor.class_name(),
            ruby_str(&descriptor.desc),
            ruby_str(&descriptor.homepage),
        );

        match assets {
            FormulaAssets::Single(asset) => {
                let _ = writeln!(formula, "  url \"{}\"", ruby_str(&asset.url));
                let _ = writeln!(formula, "  sha256 \"{}\"", ruby_str(&asset.sha256));
                let _ = writeln!(formula, "  version \"{}\"", ruby_str(version));
                let _ = writeln!(formula, "  license \"{}\"", ruby_str(&descriptor.license));
            }
            FormulaAssets::Dual { arm, intel } => {
                let _ = writeln!(formula, "  version \"{}\"", ruby_str(version));
                let _ = writeln!(formula, "  license \"{}\"", ruby_str(&descriptor.license));
                formula.push_str("\n  on_macos do\n");
                for (block, asset) in [("on_arm", arm), ("on_intel", intel)] {
                    formula.push_str(&format!(
                        "    {block} do\n      url \"{}\"\n      sha256 \"{}\"\n    end\n",
                        ruby_str(&asset.url),
                        ruby_str(&asset.sha256),
                    ));
                }
                formula.push_str("  end\n");
            }
        }

        let binary = ruby_str(&descriptor.install_name);
        formula.push_str("\n  def install\n");
        let _ = writeln!(formula, "    bin.install \"{binary}\"");
        formula.push_str("  end\n\n");
        formula.push_str("  test do\n");
        // Ruby interpolation: the output needs a literal #{bin}
        let _ = writeln!(formula, "    system \"#{{bin}}/{binary}\", \"--help\"");
        formula.push_str("  end\nend\n");

        formula
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> FormulaDescriptor {
        FormulaDescriptor::new("my-tool")
            .with_desc("Does things")
            .with_homepage("https://github.com/me/my-tool")
            .with_license("MIT")
    }

    fn arm() -> AssetRef {
        AssetRef::new("https://example.com/my-tool-arm64.tar.gz", "armhash")
    }

    fn intel() -> AssetRef {
        AssetRef::new("https://example.com/my-tool-x86_64.tar.gz", "intelhash")
    }

    #[test]
    fn test_class_name() {
        assert_eq!(descriptor().class_name(), "MyTool");
        assert_eq!(FormulaDescriptor::new("app").class_name(), "App");
        assert_eq!(FormulaDescriptor::new("foo_bar.cli").class_name(), "FooBarCli");
    }

    #[test]
    fn test_single_formula_exact_text() {
        let formula = FormulaGenerator::generate(
            &descriptor(),
            "1.2.3",
            &FormulaAssets::Single(arm()),
        );
        let expected = r##"class MyTool < Formula
  desc "Does things"
  homepage "https://github.com/me/my-tool"
  url "https://example.com/my-tool-arm64.tar.gz"
  sha256 "armhash"
  version "1.2.3"
  license "MIT"

  def install
    bin.install "my-tool"
  end

  test do
    system "#{bin}/my-tool", "--help"
  end
end
"##;
        assert_eq!(formula, expected);
    }

    #[test]
    fn test_dual_formula_nests_assets() {
        let assets = FormulaAssets::select(Some(&arm()), Some(&intel()));
        let formula = FormulaGenerator::generate(&descriptor(), "1.2.3", &assets);

        assert!(formula.contains("  on_macos do\n"));
        assert!(formula.contains("    on_arm do\n      url \"https://example.com/my-tool-arm64.tar.gz\"\n      sha256 \"armhash\"\n    end\n"));
        assert!(formula.contains("    on_intel do\n      url \"https://example.com/my-tool-x86_64.tar.gz\"\n      sha256 \"intelhash\"\n    end\n"));
        assert!(!formula.lines().any(|l| l.starts_with("  url ")));
        assert!(!formula.lines().any(|l| l.starts_with("  sha256 ")));
        assert!(formula.contains("  license \"MIT\"\n"));
        assert!(formula.contains("bin.install \"my-tool\""));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let assets = FormulaAssets::select(Some(&arm()), Some(&intel()));
        let first = FormulaGenerator::generate(&descriptor(), "2.0.0", &assets);
        let second = FormulaGenerator::generate(&descriptor(), "2.0.0", &assets);
        assert_eq!(first, second);
    }

    #[test]
    fn test_select_falls_back_to_single() {
        let empty_intel = AssetRef::new("https://example.com/x.tar.gz", "");
        assert_eq!(
            FormulaAssets::select(Some(&arm()), Some(&empty_intel)),
            FormulaAssets::Single(arm())
        );
        assert_eq!(
            FormulaAssets::select(None, Some(&intel())),
            FormulaAssets::Single(intel())
        );

        let formula = FormulaGenerator::generate(
            &descriptor(),
            "1.0.0",
            &FormulaAssets::select(None, Some(&intel())),
        );
        assert_eq!(formula.matches("url \"").count(), 1);
        assert_eq!(formula.matches("sha256 \"").count(), 1);
        assert!(!formula.contains("on_arm"));
        assert!(!formula.contains("on_intel"));
    }

    #[test]
    fn test_select_none_renders_empty_fields() {
        let assets = FormulaAssets::select(None, Some(&AssetRef::default()));
        assert!(!assets.is_complete());
        let formula = FormulaGenerator::generate(&descriptor(), "1.0.0", &assets);
        assert!(formula.contains("  url \"\"\n"));
        assert!(formula.contains("  sha256 \"\"\n"));
        assert!(formula.ends_with("end\n"));
    }

    #[test]
    fn test_values_are_escaped() {
        let descriptor = descriptor().with_desc(r#"Say "hi" #{oops} \o/"#);
        let formula =
            FormulaGenerator::generate(&descriptor, "1.0.0", &FormulaAssets::Single(arm()));
        assert!(formula.contains(r#"desc "Say \"hi\" \#{oops} \\o/""#));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(descriptor().file_name(), "my-tool.rb");
    }
}
