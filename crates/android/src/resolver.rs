//! Variant resolution
//!
//! Combines one [`Flavor`] and one [`BuildType`] with the project
//! configuration into a [`ResolvedConfig`]. Resolution is pure: the same
//! inputs always produce the same output and nothing is written anywhere.
//!
//! Signing is never implicit for release builds. A release build type must
//! name a declared identity, and naming the debug keystore is refused unless
//! `signing_policy.allow_debug_signing_for_release` is set.
//!
//! # Example
//!
//! ```rust
//! use smartone_android::resolver::VariantResolver;
//! use smartone_android::variant::{BuildType, Flavor};
//! use smartone_core::config::{ProjectConfig, SigningIdentity};
//!
//! let project = ProjectConfig::default()
//!     .with_release_signing(SigningIdentity::new("upload", "keys/upload.jks", "upload"));
//! let resolved = VariantResolver::new(&project)
//!     .resolve(Flavor::Prod, BuildType::Release)
//!     .unwrap();
//!
//! assert_eq!(resolved.application_id, "com.example.smartone");
//! assert!(resolved.minify_enabled);
//! ```

use crate::variant::{BuildType, Flavor, Variant};
use serde::{Deserialize, Serialize};
use smartone_core::config::{
    BuildFeaturesConfig, CompileConfig, ProjectConfig, SigningIdentity, TestOptionsConfig,
};
use smartone_core::error::Result;
use smartone_core::Error;

/// Fully merged configuration for one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Gradle variant name, e.g. `devRelease`
    pub variant_name: String,
    /// Selected flavor
    pub flavor: Flavor,
    /// Selected build type
    pub build_type: BuildType,
    /// Base id with the flavor suffix, then the build-type suffix
    pub application_id: String,
    /// Package of generated classes, never suffixed
    pub namespace: String,
    /// Flavor display name, or the base name
    pub app_name: String,
    /// Base version with the flavor suffix, then the build-type suffix
    pub version_name: String,
    /// Store version code
    pub version_code: u32,
    /// Lowest supported API level
    pub min_sdk: u32,
    /// API level the app is tested against
    pub target_sdk: u32,
    /// API level the app is compiled against
    pub compile_sdk: u32,
    /// NDK release used for native code
    pub ndk_version: String,
    /// Java debugger may attach
    pub debuggable: bool,
    /// Native debugger may attach
    pub jni_debuggable: bool,
    /// RenderScript kernels built with debug info
    pub renderscript_debuggable: bool,
    /// Code shrinking and obfuscation
    pub minify_enabled: bool,
    /// Drop unreferenced resources
    pub shrink_resources: bool,
    /// Package the pseudo-locales
    pub pseudo_locales_enabled: bool,
    /// Recompress PNG resources
    pub crunch_pngs: bool,
    /// R8 rule files, in order
    pub proguard_files: Vec<String>,
    /// Identity the artifact is signed with
    pub signing: SigningIdentity,
    /// Split dex files past the method limit
    pub multidex_enabled: bool,
    /// Rasterize vector drawables through the support library
    pub vector_drawables_use_support_library: bool,
    /// Runner class for instrumented tests
    pub test_instrumentation_runner: String,
    /// Native ABIs packaged
    pub abi_filters: Vec<String>,
    /// Java and Kotlin targets and desugaring
    pub compile: CompileConfig,
    /// Enabled build features
    pub build_features: BuildFeaturesConfig,
    /// Local unit test settings
    pub test_options: TestOptionsConfig,
    /// Archive entries dropped from the package
    pub packaging_excludes: Vec<String>,
}

impl ResolvedConfig {
    /// The variant this configuration was resolved for
    pub fn variant(&self) -> Variant {
        Variant::new(self.flavor, self.build_type)
    }
}

/// Resolves variants against a project configuration
#[derive(Debug, Clone, Copy)]
pub struct VariantResolver<'a> {
    project: &'a ProjectConfig,
}

impl<'a> VariantResolver<'a> {
    /// Resolver over `project`
    pub fn new(project: &'a ProjectConfig) -> Self {
        Self { project }
    }

    /// Resolve a single variant
    pub fn resolve(&self, flavor: Flavor, build_type: BuildType) -> Result<ResolvedConfig> {
        let variant = Variant::new(flavor, build_type);
        let app = &self.project.app;
        let flavor_config = flavor.config(self.project);
        let build_config = build_type.config(self.project);

        let signing = self.signing_for(variant)?;

        let application_id = concat_suffixes(
            &app.application_id,
            [
                flavor_config.application_id_suffix.as_deref(),
                build_config.application_id_suffix.as_deref(),
            ],
        );
        let version_name = concat_suffixes(
            &app.version_name,
            [
                flavor_config.version_name_suffix.as_deref(),
                build_config.version_name_suffix.as_deref(),
            ],
        );
        let app_name = flavor_config
            .app_name
            .clone()
            .unwrap_or_else(|| app.app_name.clone());

        tracing::debug!(
            variant = %variant,
            application_id = %application_id,
            signing = %signing.name,
            "Resolved variant"
        );

        Ok(ResolvedConfig {
            variant_name: variant.name(),
            flavor,
            build_type,
            application_id,
            namespace: app.namespace.clone(),
            app_name,
            version_name,
            version_code: app.version_code,
            min_sdk: app.min_sdk,
            target_sdk: app.target_sdk,
            compile_sdk: app.compile_sdk,
            ndk_version: app.ndk_version.clone(),
            debuggable: build_config.debuggable,
            jni_debuggable: build_config.jni_debuggable,
            renderscript_debuggable: build_config.renderscript_debuggable,
            minify_enabled: build_config.minify_enabled,
            shrink_resources: build_config.shrink_resources,
            pseudo_locales_enabled: build_config.pseudo_locales_enabled,
            crunch_pngs: build_config.crunch_pngs,
            proguard_files: build_config.proguard_files.clone(),
            signing,
            multidex_enabled: app.multidex_enabled,
            vector_drawables_use_support_library: app.vector_drawables_use_support_library,
            test_instrumentation_runner: app.test_instrumentation_runner.clone(),
            abi_filters: app.abi_filters.clone(),
            compile: self.project.compile.clone(),
            build_features: self.project.build_features.clone(),
            test_options: self.project.test_options.clone(),
            packaging_excludes: self.project.packaging.resource_excludes.clone(),
        })
    }

    /// Parse string selectors, then resolve
    pub fn resolve_named(&self, flavor: &str, build_type: &str) -> Result<ResolvedConfig> {
        let variant = Variant::parse(flavor, build_type)?;
        self.resolve(variant.flavor, variant.build_type)
    }

    /// Resolve every variant, stopping at the first failure
    pub fn resolve_all(&self) -> Result<Vec<ResolvedConfig>> {
        Variant::all()
            .map(|v| self.resolve(v.flavor, v.build_type))
            .collect()
    }

    /// Resolve every variant, keeping each outcome
    pub fn try_resolve_each(&self) -> Vec<(Variant, Result<ResolvedConfig>)> {
        Variant::all()
            .map(|v| (v, self.resolve(v.flavor, v.build_type)))
            .collect()
    }

    fn signing_for(&self, variant: Variant) -> Result<SigningIdentity> {
        let build_config = variant.build_type.config(self.project);
        let name = variant.to_string();

        let identity = match build_config.signing_config.as_deref() {
            Some(reference) => self
                .project
                .signing_identity(reference)
                .ok_or_else(|| Error::unknown_signing_identity(&name, reference))?,
            None if variant.build_type.is_release() => {
                return Err(Error::missing_signing_identity(&name));
            }
            None => SigningIdentity::debug(),
        };

        if variant.build_type.is_release() && identity.is_debug() {
            if !self.project.signing_policy.allow_debug_signing_for_release {
                return Err(Error::debug_signing_for_release(&name));
            }
            tracing::warn!(variant = %name, "Release variant signed with the debug keystore");
        }

        Ok(identity)
    }
}

/// Resolve a variant against `project`
pub fn resolve(project: &ProjectConfig, flavor: Flavor, build_type: BuildType) -> Result<ResolvedConfig> {
    VariantResolver::new(project).resolve(flavor, build_type)
}

fn concat_suffixes<const N: usize>(base: &str, suffixes: [Option<&str>; N]) -> String {
    suffixes.into_iter().flatten().fold(base.to_string(), |mut acc, suffix| {
        acc.push_str(suffix);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smartone_core::config::parse_config;
    use smartone_core::ErrorCode;

    fn signed_project() -> ProjectConfig {
        ProjectConfig::default().with_release_signing(
            SigningIdentity::new("upload", "keys/upload.jks", "upload")
                .with_password_env("SMARTONE_STORE_PASSWORD", "SMARTONE_KEY_PASSWORD"),
        )
    }

    #[test]
    fn test_dev_debug() {
        let project = ProjectConfig::default();
        let resolved = resolve(&project, Flavor::Dev, BuildType::Debug).unwrap();

        assert_eq!(resolved.variant_name, "devDebug");
        assert_eq!(resolved.application_id, "com.example.smartone.dev");
        assert!(resolved.application_id.ends_with(".dev"));
        assert_eq!(resolved.app_name, "SmartOne Dev");
        assert_eq!(resolved.version_name, "1.0.0-dev");
        assert!(resolved.debuggable);
        assert!(resolved.jni_debuggable);
        assert!(!resolved.minify_enabled);
        assert!(!resolved.shrink_resources);
        assert!(resolved.signing.is_debug());
    }

    #[test]
    fn test_prod_release() {
        let project = signed_project();
        let resolved = resolve(&project, Flavor::Prod, BuildType::Release).unwrap();

        assert_eq!(resolved.variant_name, "prodRelease");
        assert_eq!(resolved.application_id, "com.example.smartone");
        assert_eq!(resolved.app_name, "SmartOne");
        assert_eq!(resolved.version_name, "1.0.0");
        assert!(!resolved.debuggable);
        assert!(resolved.minify_enabled);
        assert!(resolved.shrink_resources);
        assert!(resolved.pseudo_locales_enabled);
        assert_eq!(resolved.signing.name, "upload");
        assert_eq!(resolved.abi_filters, ["armeabi-v7a", "arm64-v8a", "x86_64"]);

        assert_eq!(resolved.ndk_version, "25.1.8937393");
        assert_eq!(resolved.compile.java_source_compatibility, "11");
        assert_eq!(resolved.compile.java_target_compatibility, "11");
        assert_eq!(resolved.compile.kotlin_jvm_target, "11");
        assert_eq!(resolved.compile.kotlin_compiler_args, ["-Xjvm-default=all"]);
        assert!(resolved.compile.core_library_desugaring);
        assert!(resolved.build_features.view_binding);
        assert!(resolved.build_features.build_config);
        assert!(resolved.build_features.data_binding);
        assert!(!resolved.build_features.compose);
        assert!(resolved.vector_drawables_use_support_library);
        assert_eq!(
            resolved.test_instrumentation_runner,
            "androidx.test.runner.AndroidJUnitRunner"
        );
        assert!(resolved.test_options.include_android_resources);
        assert!(resolved.test_options.return_default_values);
    }

    #[test]
    fn test_dev_release_keeps_flavor_branding() {
        let project = signed_project();
        let resolved = resolve(&project, Flavor::Dev, BuildType::Release).unwrap();

        assert_eq!(resolved.application_id, "com.example.smartone.dev");
        assert_eq!(resolved.app_name, "SmartOne Dev");
        assert!(resolved.minify_enabled);
        assert!(!resolved.debuggable);
    }

    #[test]
    fn test_invalid_flavor_is_rejected() {
        let project = signed_project();
        let err = VariantResolver::new(&project)
            .resolve_named("staging", "debug")
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidVariant);
        assert!(err.message.contains("staging"));
    }

    #[test]
    fn test_invalid_build_type_is_rejected() {
        let project = signed_project();
        let err = VariantResolver::new(&project)
            .resolve_named("prod", "beta")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidVariant);
    }

    #[test]
    fn test_release_without_signing_identity_is_rejected() {
        let project = ProjectConfig::default();
        for flavor in Flavor::ALL {
            let err = resolve(&project, flavor, BuildType::Release).unwrap_err();
            assert_eq!(err.code, ErrorCode::MissingSigningIdentity);
        }
    }

    #[test]
    fn test_release_referencing_debug_identity_is_rejected() {
        let mut project = ProjectConfig::default();
        project.build_types.release.signing_config = Some("debug".to_string());

        let err = resolve(&project, Flavor::Prod, BuildType::Release).unwrap_err();
        assert_eq!(err.code, ErrorCode::DebugSigningForRelease);
    }

    #[test]
    fn test_debug_signing_for_release_when_allowed() {
        let project = parse_config(
            r#"
            [build_types.release]
            signing_config = "debug"

            [signing_policy]
            allow_debug_signing_for_release = true
            "#,
        )
        .unwrap();

        let resolved = resolve(&project, Flavor::Prod, BuildType::Release).unwrap();
        assert!(resolved.signing.is_debug());
    }

    #[test]
    fn test_unknown_signing_reference() {
        let mut project = ProjectConfig::default();
        project.build_types.debug.signing_config = Some("team".to_string());

        let err = resolve(&project, Flavor::Dev, BuildType::Debug).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownSigningIdentity);
        assert!(err.message.contains("team"));
    }

    #[test]
    fn test_build_type_suffixes_follow_flavor_suffixes() {
        let mut project = ProjectConfig::default();
        project.build_types.debug.application_id_suffix = Some(".debug".to_string());
        project.build_types.debug.version_name_suffix = Some("-SNAPSHOT".to_string());

        let resolved = resolve(&project, Flavor::Dev, BuildType::Debug).unwrap();
        assert_eq!(resolved.application_id, "com.example.smartone.dev.debug");
        assert_eq!(resolved.version_name, "1.0.0-dev-SNAPSHOT");
    }

    #[test]
    fn test_missing_flavor_name_falls_back_to_base() {
        let mut project = ProjectConfig::default();
        project.flavors.dev.app_name = None;

        let resolved = resolve(&project, Flavor::Dev, BuildType::Debug).unwrap();
        assert_eq!(resolved.app_name, "SmartOne");
    }

    #[test]
    fn test_resolve_all_stops_on_unsigned_release() {
        let project = ProjectConfig::default();
        let err = VariantResolver::new(&project).resolve_all().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingSigningIdentity);
        assert!(err.message.contains("devRelease"));

        let outcomes = VariantResolver::new(&project).try_resolve_each();
        let ok: Vec<String> = outcomes
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(v, _)| v.name())
            .collect();
        assert_eq!(ok, ["devDebug", "prodDebug"]);
    }

    #[test]
    fn test_resolve_all_signed() {
        let project = signed_project();
        let all = VariantResolver::new(&project).resolve_all().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].variant(), Variant::new(Flavor::Prod, BuildType::Release));
    }

    #[test]
    fn test_resolved_config_serializes_for_tooling() {
        let project = signed_project();
        let resolved = resolve(&project, Flavor::Prod, BuildType::Release).unwrap();
        let json = serde_json::to_value(&resolved).unwrap();

        assert_eq!(json["flavor"], "prod");
        assert_eq!(json["build_type"], "release");
        assert_eq!(json["signing"]["key_password_env"], "SMARTONE_KEY_PASSWORD");
        assert_eq!(json["compile"]["java_target_compatibility"], "11");
        assert_eq!(json["build_features"]["compose"], false);
    }

    proptest! {
        #[test]
        fn prop_resolve_is_deterministic(flavor_idx in 0usize..2, build_idx in 0usize..2) {
            let project = signed_project();
            let resolver = VariantResolver::new(&project);
            let flavor = Flavor::ALL[flavor_idx];
            let build_type = BuildType::ALL[build_idx];

            let first = resolver.resolve(flavor, build_type).unwrap();
            let second = resolver.resolve(flavor, build_type).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_unknown_flavor_never_resolves(flavor in "[a-zA-Z]{1,12}") {
            prop_assume!(flavor != "dev" && flavor != "prod");
            let project = signed_project();
            let err = VariantResolver::new(&project)
                .resolve_named(&flavor, "debug")
                .unwrap_err();
            prop_assert_eq!(err.code, ErrorCode::InvalidVariant);
        }

        #[test]
        fn prop_unknown_build_type_never_resolves(build_type in "\\PC{0,16}") {
            prop_assume!(build_type != "debug" && build_type != "release");
            let project = signed_project();
            let err = VariantResolver::new(&project)
                .resolve_named("prod", &build_type)
                .unwrap_err();
            prop_assert_eq!(err.code, ErrorCode::InvalidVariant);
        }
    }
}
