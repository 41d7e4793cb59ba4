//! Flag bitsets carried by classes, structs, functions, states and properties.

use bitflags::bitflags;

bitflags! {
    /// Attributes of a property (`CPF_*`).
    ///
    /// Variable modifiers map onto these one to one; the compiler sets the
    /// parameter bits (`PARM`, `OUT_PARM`, `RETURN_PARM`, ...) itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u64 {
        /// Editable in the property window (`var()`).
        const EDIT = 0x0000_0001;
        /// Read-only from script.
        const CONST = 0x0000_0002;
        /// Bound to an input axis or button.
        const INPUT = 0x0000_0004;
        /// Referenced object is exported with its owner.
        const EXPORT_OBJECT = 0x0000_0008;
        /// Optional function parameter.
        const OPTIONAL_PARM = 0x0000_0010;
        /// Listed in the replication block.
        const NET = 0x0000_0020;
        /// Fixed-size array length is not editable.
        const EDIT_FIXED_SIZE = 0x0000_0040;
        /// Function parameter.
        const PARM = 0x0000_0080;
        /// Passed by reference (`out`).
        const OUT_PARM = 0x0000_0100;
        /// Parameter that the VM skips when its bool result is known (`skip`).
        const SKIP_PARM = 0x0000_0200;
        /// Function return value.
        const RETURN_PARM = 0x0000_0400;
        /// Parameter accepts lossy conversions (`coerce`).
        const COERCE_PARM = 0x0000_0800;
        /// Serialized by native code.
        const NATIVE = 0x0000_1000;
        /// Not saved to disk.
        const TRANSIENT = 0x0000_2000;
        /// Loaded from the class config file.
        const CONFIG = 0x0000_4000;
        /// Loaded from the localization file.
        const LOCALIZED = 0x0000_8000;
        /// Visible but not editable in the property window.
        const EDIT_CONST = 0x0002_0000;
        /// Config value shared by all subclasses.
        const GLOBAL_CONFIG = 0x0004_0000;
        /// Property is a component reference.
        const COMPONENT = 0x0008_0000;
        /// Always reinitialized from defaults.
        const ALWAYS_INIT = 0x0010_0000;
        /// Skipped when duplicating the owner.
        const DUPLICATE_TRANSIENT = 0x0020_0000;
        /// Needs construction or destruction in native code.
        const NEED_CTOR_LINK = 0x0040_0000;
        /// Not exported to the native header.
        const NO_EXPORT = 0x0080_0000;
        /// Not imported from text.
        const NO_IMPORT = 0x0100_0000;
        /// The editor may not clear this reference.
        const NO_CLEAR = 0x0200_0000;
        /// Edited inline in the property window.
        const EDIT_INLINE = 0x0400_0000;
        /// Inline editing restricted to choosing a class.
        const EDIT_INLINE_USE = 0x1000_0000;
        /// Loaded but not saved; references produce a warning.
        const DEPRECATED = 0x2000_0000;
        /// Bound to a data store.
        const DATA_BINDING = 0x4000_0000;
        /// Serialized as text.
        const SERIALIZE_TEXT = 0x8000_0000;
        /// Notify event on replication (`repnotify`).
        const REP_NOTIFY = 0x0001_0000_0000;
        /// Animatable by matinee (`interp`).
        const INTERP = 0x0002_0000_0000;
        /// Changes are not recorded in the undo buffer.
        const NON_TRANSACTIONAL = 0x0004_0000_0000;
        /// Only exists in editor builds.
        const EDITOR_ONLY = 0x0008_0000_0000;
        /// Stripped on consoles.
        const NOT_FOR_CONSOLE = 0x0010_0000_0000;
        /// Retry replication of this property (`repretry`).
        const REP_RETRY = 0x0020_0000_0000;
        /// Writable only by the declaring class (`privatewrite`).
        const PRIVATE_WRITE = 0x0040_0000_0000;
        /// Writable only by the declaring class and subclasses (`protectedwrite`).
        const PROTECTED_WRITE = 0x0080_0000_0000;
        /// Serialized for archetypes only.
        const ARCHETYPE_PROPERTY = 0x0100_0000_0000;
        /// Hidden in the property window (`edithide`).
        const EDIT_HIDE = 0x0200_0000_0000;
        /// Edited through a text box (`edittextbox`).
        const EDIT_TEXT_BOX = 0x0400_0000_0000;
        /// Passive cross-level reference.
        const CROSS_LEVEL_PASSIVE = 0x1000_0000_0000;
        /// Active cross-level reference.
        const CROSS_LEVEL_ACTIVE = 0x2000_0000_0000;
        /// Accessible only within the declaring class (`private`).
        const PRIVATE = 0x0001_0000_0000_0000;
        /// Accessible in the declaring class and subclasses (`protected`).
        const PROTECTED = 0x0002_0000_0000_0000;
        /// Struct constructed in place when passed to native code (`init`).
        const INIT = 0x0004_0000_0000_0000;

        /// Bits describing parameter passing.
        const PARM_FLAGS = Self::OPTIONAL_PARM.bits()
            | Self::PARM.bits()
            | Self::OUT_PARM.bits()
            | Self::SKIP_PARM.bits()
            | Self::RETURN_PARM.bits()
            | Self::COERCE_PARM.bits();
        /// Bits that may only be applied to members of a native class.
        const NATIVE_ONLY = Self::NATIVE.bits() | Self::NO_EXPORT.bits();
    }
}

bitflags! {
    /// Attributes of a class (`CLASS_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        /// May not be instantiated.
        const ABSTRACT = 0x0000_0001;
        /// Bytecode has been compiled.
        const COMPILED = 0x0000_0002;
        /// Loads config properties.
        const CONFIG = 0x0000_0004;
        /// Instances are never saved.
        const TRANSIENT = 0x0000_0008;
        /// Pass 1 finished successfully.
        const PARSED = 0x0000_0010;
        /// Loads localized properties.
        const LOCALIZED = 0x0000_0020;
        /// Safe to replace with a different class on load.
        const SAFE_REPLACE = 0x0000_0040;
        /// Has a native C++ counterpart.
        const NATIVE = 0x0000_0080;
        /// Native declaration is hand written (`noexport`).
        const NO_EXPORT = 0x0000_0100;
        /// Can be placed in a level.
        const PLACEABLE = 0x0000_0200;
        /// Config is stored per object.
        const PER_OBJECT_CONFIG = 0x0000_0400;
        /// Replication is evaluated natively.
        const NATIVE_REPLICATION = 0x0000_0800;
        /// Can be created inline in the property window.
        const EDIT_INLINE_NEW = 0x0000_1000;
        /// Categories are not shown in the property window.
        const COLLAPSE_CATEGORIES = 0x0000_2000;
        /// Declared with `interface`.
        const INTERFACE = 0x0000_4000;
        /// Has instanced (component or editinline) properties.
        const HAS_INSTANCED_PROPS = 0x0020_0000;
        /// Deprecated class.
        const DEPRECATED = 0x0040_0000;
        /// Hidden from class drop downs.
        const HIDE_DROP_DOWN = 0x0080_0000;
        /// Header has been exported in this run.
        const EXPORTED = 0x0100_0000;
        /// Defined natively with no script source.
        const INTRINSIC = 0x0200_0000;
        /// Native interface with no script body (`nativeonly`).
        const NATIVE_ONLY = 0x0400_0000;
        /// Localization is stored per object.
        const PER_OBJECT_LOCALIZED = 0x0800_0000;
        /// Has cross-level references.
        const HAS_CROSS_LEVEL_REFS = 0x1000_0000;
        /// Native layout no longer matches the script layout.
        const MISALIGNED = 0x4000_0000;

        /// Flags a subclass inherits from its parent.
        const INHERIT = Self::TRANSIENT.bits()
            | Self::CONFIG.bits()
            | Self::LOCALIZED.bits()
            | Self::SAFE_REPLACE.bits()
            | Self::PER_OBJECT_CONFIG.bits()
            | Self::PER_OBJECT_LOCALIZED.bits()
            | Self::PLACEABLE.bits()
            | Self::HAS_INSTANCED_PROPS.bits()
            | Self::DEPRECATED.bits()
            | Self::HAS_CROSS_LEVEL_REFS.bits();
        /// Flags cleared when a class is reset after a failed compile.
        const RECOMPILE_CLEAR = Self::PARSED.bits() | Self::COMPILED.bits();
    }
}

bitflags! {
    /// Attributes of a function (`FUNC_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u32 {
        /// Cannot be overridden (`final`).
        const FINAL = 0x0000_0001;
        /// Has a body.
        const DEFINED = 0x0000_0002;
        /// Native iterator usable in `foreach`.
        const ITERATOR = 0x0000_0004;
        /// Latent, only callable from state code.
        const LATENT = 0x0000_0008;
        /// Unary operator written before its operand.
        const PRE_OPERATOR = 0x0000_0010;
        /// Not reentrant (`singular`).
        const SINGULAR = 0x0000_0020;
        /// Replicated (`server`/`client`).
        const NET = 0x0000_0040;
        /// Reliable replication.
        const NET_RELIABLE = 0x0000_0080;
        /// Executes on simulated proxies.
        const SIMULATED = 0x0000_0100;
        /// Callable from the console (`exec`).
        const EXEC = 0x0000_0200;
        /// Implemented in native code.
        const NATIVE = 0x0000_0400;
        /// Callable from native code (`event`).
        const EVENT = 0x0000_0800;
        /// Operator function.
        const OPERATOR = 0x0000_1000;
        /// Class-level (`static`).
        const STATIC = 0x0000_2000;
        /// Has optional parameters.
        const HAS_OPTIONAL_PARMS = 0x0000_4000;
        /// Does not modify the object (`const`).
        const CONST = 0x0000_8000;
        /// Visible to all classes.
        const PUBLIC = 0x0002_0000;
        /// Visible only to the declaring class.
        const PRIVATE = 0x0004_0000;
        /// Visible to the declaring class and subclasses.
        const PROTECTED = 0x0008_0000;
        /// Delegate declaration.
        const DELEGATE = 0x0010_0000;
        /// Executes on the server.
        const NET_SERVER = 0x0020_0000;
        /// Has out parameters.
        const HAS_OUT_PARMS = 0x0040_0000;
        /// Has parameters with default values.
        const HAS_DEFAULTS = 0x0080_0000;
        /// Executes on the owning client.
        const NET_CLIENT = 0x0100_0000;
        /// Imported from a DLL (`dllimport`).
        const DLL_IMPORT = 0x0200_0000;
        /// Not exported to the native header.
        const NO_EXPORT = 0x0400_0000;
        /// Exported as a virtual C++ method.
        const VIRTUAL = 0x0800_0000;

        /// Flags an override takes from the function it overrides.
        const INHERIT = Self::EXEC.bits() | Self::EVENT.bits();
        /// Flags an override must match exactly.
        const OVERRIDE_MATCH = Self::EXEC.bits()
            | Self::FINAL.bits()
            | Self::LATENT.bits()
            | Self::PRE_OPERATOR.bits()
            | Self::ITERATOR.bits()
            | Self::STATIC.bits()
            | Self::PUBLIC.bits()
            | Self::PROTECTED.bits()
            | Self::CONST.bits();
        /// Replication bits, copied from a replicated parent function.
        const NET_FUNC_FLAGS = Self::NET.bits()
            | Self::NET_RELIABLE.bits()
            | Self::NET_SERVER.bits()
            | Self::NET_CLIENT.bits();
        /// Access specifiers.
        const ACCESS = Self::PUBLIC.bits() | Self::PRIVATE.bits() | Self::PROTECTED.bits();
    }
}

bitflags! {
    /// Attributes of a script struct (`STRUCT_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StructFlags: u32 {
        /// Has a native C++ definition.
        const NATIVE = 0x0000_0001;
        /// Exported to the class header.
        const EXPORT = 0x0000_0002;
        /// Contains component references.
        const HAS_COMPONENTS = 0x0000_0004;
        /// Never saved.
        const TRANSIENT = 0x0000_0008;
        /// Serialized as a single unit.
        const ATOMIC = 0x0000_0010;
        /// Serialized in binary form even in text formats.
        const IMMUTABLE = 0x0000_0020;
        /// Config import ignores unspecified members.
        const STRICT_CONFIG = 0x0000_0040;
        /// Immutable in cooked builds only.
        const IMMUTABLE_WHEN_COOKED = 0x0000_0080;
        /// Atomic in cooked builds only.
        const ATOMIC_WHEN_COOKED = 0x0000_0100;

        /// Flags a child struct inherits from its parent.
        const INHERIT = Self::HAS_COMPONENTS.bits()
            | Self::ATOMIC.bits()
            | Self::ATOMIC_WHEN_COOKED.bits()
            | Self::STRICT_CONFIG.bits();
    }
}

bitflags! {
    /// Attributes of a state (`STATE_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateFlags: u32 {
        /// Shown in the editor state list.
        const EDITABLE = 0x0000_0001;
        /// Entered automatically on spawn.
        const AUTO = 0x0000_0002;
        /// Executes on simulated proxies.
        const SIMULATED = 0x0000_0004;
        /// Declares locals in its state code.
        const HAS_LOCALS = 0x0000_0008;
    }
}

bitflags! {
    /// Target platforms a class or function is restricted to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PlatformFlags: u32 {
        /// Windows.
        const WINDOWS = 0x0000_0001;
        /// Xbox 360.
        const XBOX360 = 0x0000_0002;
        /// PlayStation 3.
        const PS3 = 0x0000_0004;
        /// Linux.
        const LINUX = 0x0000_0008;
        /// Mac OS.
        const MAC = 0x0000_0010;
        /// iPhone.
        const IPHONE = 0x0000_0020;

        /// Every console.
        const CONSOLE = Self::XBOX360.bits() | Self::PS3.bits() | Self::IPHONE.bits();
        /// Every desktop platform.
        const PC = Self::WINDOWS.bits() | Self::LINUX.bits() | Self::MAC.bits();
    }
}

impl Default for PlatformFlags {
    fn default() -> Self {
        PlatformFlags::all()
    }
}

impl PlatformFlags {
    /// Parse a platform name used in `platform(...)` attributes.
    pub fn from_platform_name(name: &str) -> Option<PlatformFlags> {
        let flags = match name.to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win64" => PlatformFlags::WINDOWS,
            "xbox360" | "xenon" => PlatformFlags::XBOX360,
            "ps3" => PlatformFlags::PS3,
            "linux" => PlatformFlags::LINUX,
            "mac" | "macos" => PlatformFlags::MAC,
            "iphone" => PlatformFlags::IPHONE,
            "console" => PlatformFlags::CONSOLE,
            "pc" => PlatformFlags::PC,
            _ => return None,
        };
        Some(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parm_mask_covers_parameter_bits() {
        assert!(PropertyFlags::PARM_FLAGS.contains(PropertyFlags::OUT_PARM));
        assert!(PropertyFlags::PARM_FLAGS.contains(PropertyFlags::COERCE_PARM));
        assert!(!PropertyFlags::PARM_FLAGS.contains(PropertyFlags::CONFIG));
    }

    #[test]
    fn override_match_includes_final() {
        assert!(FunctionFlags::OVERRIDE_MATCH.contains(FunctionFlags::FINAL));
        assert!(!FunctionFlags::OVERRIDE_MATCH.contains(FunctionFlags::NATIVE));
    }

    #[test]
    fn class_inherit_mask() {
        let parent = ClassFlags::NATIVE | ClassFlags::CONFIG | ClassFlags::PLACEABLE;
        let inherited = parent & ClassFlags::INHERIT;
        assert_eq!(inherited, ClassFlags::CONFIG | ClassFlags::PLACEABLE);
    }

    #[test]
    fn platform_names() {
        assert_eq!(PlatformFlags::from_platform_name("PS3"), Some(PlatformFlags::PS3));
        assert_eq!(PlatformFlags::from_platform_name("Console"), Some(PlatformFlags::CONSOLE));
        assert_eq!(PlatformFlags::from_platform_name("Amiga"), None);
        assert_eq!(PlatformFlags::default(), PlatformFlags::all());
    }
}
