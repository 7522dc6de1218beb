//! Natives of the core class hierarchy: `Object`, `RefCounted`, `Resource`
//! and `Node`.

use enginebridge_core::{
    CallError, Callable, ConnectFlags, ConversionError, EngineError, ObjectId, StringName, Variant, VariantType,
};

use crate::{CallContext, ClassDb, ClassInfo, MethodInfo, PropertyInfo, RegistrationError};

/// Register the core classes with all their methods, properties and signals.
pub fn register_core_classes(db: &ClassDb) -> Result<(), RegistrationError> {
    register_object(db)?;
    register_ref_counted(db)?;
    register_resource(db)?;
    register_node(db)?;
    Ok(())
}

fn status(result: Result<(), EngineError>) -> i64 {
    match result {
        Ok(()) => EngineError::OK,
        Err(err) => err.code(),
    }
}

fn object_arg(ctx: &CallContext<'_>, index: usize, expected: &'static str) -> Result<ObjectId, CallError> {
    let object: Option<ObjectId> = ctx.arg(index)?;
    object.ok_or(CallError::InvalidArgument {
        index,
        source: ConversionError::NullObject { expected },
    })
}

// ============================================================================
// Object
// ============================================================================

fn register_object(db: &ClassDb) -> Result<(), RegistrationError> {
    db.register_class(ClassInfo::new("Object"))?;

    db.register_method("Object", MethodInfo::new("get_class").returns(VariantType::String), |ctx| {
        let class = ctx.db().class_of(ctx.instance()?).ok_or(CallError::InstanceIsNull)?;
        ctx.set_return(class.to_string())
    })?;

    db.register_method(
        "Object",
        MethodInfo::new("is_class")
            .arg("class", VariantType::String)
            .returns(VariantType::Bool),
        |ctx| {
            let ancestor: String = ctx.arg(0)?;
            let result = ctx.db().is_instance_of(ctx.instance()?, &ancestor);
            ctx.set_return(result)
        },
    )?;

    db.register_method("Object", MethodInfo::new("get_instance_id").returns(VariantType::Int), |ctx| {
        let id = ctx.instance()?;
        ctx.set_return(id.raw() as i64)
    })?;

    db.register_method(
        "Object",
        MethodInfo::new("has_method")
            .arg("method", VariantType::StringName)
            .returns(VariantType::Bool),
        |ctx| {
            let method: StringName = ctx.arg(0)?;
            let result = ctx.db().has_method(ctx.instance()?, &method);
            ctx.set_return(result)
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("has_signal")
            .arg("signal", VariantType::StringName)
            .returns(VariantType::Bool),
        |ctx| {
            let signal: StringName = ctx.arg(0)?;
            let result = ctx.db().has_signal(ctx.instance()?, &signal);
            ctx.set_return(result)
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("set")
            .arg("property", VariantType::StringName)
            .arg("value", VariantType::Nil),
        |ctx| {
            let property: StringName = ctx.arg(0)?;
            let value: Variant = ctx.arg(1)?;
            ctx.db().set_property(ctx.instance()?, &property, value)
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("get")
            .arg("property", VariantType::StringName)
            .returns(VariantType::Nil),
        |ctx| {
            let property: StringName = ctx.arg(0)?;
            let value = ctx.db().get_property(ctx.instance()?, &property)?;
            ctx.set_return(value.unwrap_or_default())
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("call")
            .arg("method", VariantType::StringName)
            .returns(VariantType::Nil)
            .vararg(),
        |ctx| {
            let method: StringName = ctx.arg(0)?;
            let rest = ctx.args_as_variants()?.split_off(1);
            let result = ctx.db().call_method(ctx.instance()?, &method, &rest)?;
            ctx.set_return_variant(result)
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("emit_signal")
            .arg("signal", VariantType::StringName)
            .returns(VariantType::Int)
            .vararg(),
        |ctx| {
            let signal: StringName = ctx.arg(0)?;
            let rest = ctx.args_as_variants()?.split_off(1);
            let code = status(ctx.db().emit_signal(ctx.instance()?, &signal, &rest));
            ctx.set_return(code)
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("connect")
            .arg("signal", VariantType::StringName)
            .arg("callable", VariantType::Callable)
            .arg("flags", VariantType::Int)
            .default_arg(Variant::Int(0))
            .returns(VariantType::Int),
        |ctx| {
            let signal: StringName = ctx.arg(0)?;
            let callable: Callable = ctx.arg(1)?;
            let flags: i64 = ctx.arg(2)?;
            let flags = ConnectFlags::from_bits_truncate(u32::try_from(flags).unwrap_or_default());
            let code = status(ctx.db().connect(ctx.instance()?, &signal, callable, flags));
            ctx.set_return(code)
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("disconnect")
            .arg("signal", VariantType::StringName)
            .arg("callable", VariantType::Callable),
        |ctx| {
            let signal: StringName = ctx.arg(0)?;
            let callable: Callable = ctx.arg(1)?;
            let id = ctx.instance()?;
            if let Err(err) = ctx.db().disconnect(id, &signal, &callable) {
                log::error!("disconnect {signal} on instance {id}: {err}");
            }
            Ok(())
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("is_connected")
            .arg("signal", VariantType::StringName)
            .arg("callable", VariantType::Callable)
            .returns(VariantType::Bool),
        |ctx| {
            let signal: StringName = ctx.arg(0)?;
            let callable: Callable = ctx.arg(1)?;
            let result = ctx.db().is_connected(ctx.instance()?, &signal, &callable);
            ctx.set_return(result)
        },
    )?;

    db.register_method(
        "Object",
        MethodInfo::new("notification")
            .arg("what", VariantType::Int)
            .arg("reversed", VariantType::Bool)
            .default_arg(Variant::Bool(false)),
        |ctx| {
            let what: i64 = ctx.arg(0)?;
            ctx.call_virtual("_notification", &[Variant::Int(what)])?;
            Ok(())
        },
    )?;

    db.register_method("Object", MethodInfo::new("to_string").returns(VariantType::String), |ctx| {
        let id = ctx.instance()?;
        let text = match ctx.call_virtual("_to_string", &[])? {
            Some(Variant::String(text)) => text,
            _ => {
                let class = ctx.db().class_of(id).ok_or(CallError::InstanceIsNull)?;
                format!("<{class}#{id}>")
            }
        };
        ctx.set_return(text)
    })?;

    db.register_signal("Object", "script_changed")?;
    db.register_signal("Object", "property_list_changed")?;
    Ok(())
}

// ============================================================================
// RefCounted
// ============================================================================

fn register_ref_counted(db: &ClassDb) -> Result<(), RegistrationError> {
    db.register_class(ClassInfo::new("RefCounted").inherits("Object").refcounted())?;

    for name in ["init_ref", "reference"] {
        db.register_method("RefCounted", MethodInfo::new(name).returns(VariantType::Bool), |ctx| {
            let taken = ctx.db().reference(ctx.instance()?).is_some();
            ctx.set_return(taken)
        })?;
    }

    db.register_method("RefCounted", MethodInfo::new("unreference").returns(VariantType::Bool), |ctx| {
        let last = ctx.db().unreference(ctx.instance()?) == Some(0);
        ctx.set_return(last)
    })?;

    db.register_method(
        "RefCounted",
        MethodInfo::new("get_reference_count").returns(VariantType::Int),
        |ctx| {
            let count = ctx.db().reference_count(ctx.instance()?).unwrap_or_default();
            ctx.set_return(i64::from(count))
        },
    )?;
    Ok(())
}

// ============================================================================
// Resource
// ============================================================================

fn register_resource(db: &ClassDb) -> Result<(), RegistrationError> {
    db.register_class(ClassInfo::new("Resource").inherits("RefCounted"))?;

    db.register_property_accessors(
        "Resource",
        PropertyInfo::new("resource_name", VariantType::String)
            .setter("set_name")
            .getter("get_name"),
    )?;
    db.register_property_accessors(
        "Resource",
        PropertyInfo::new("resource_path", VariantType::String)
            .setter("set_path")
            .getter("get_path"),
    )?;

    db.register_method("Resource", MethodInfo::new("emit_changed"), |ctx| {
        if let Err(err) = ctx.emit_signal("changed", &[]) {
            log::error!("emit_changed: {err}");
        }
        Ok(())
    })?;

    db.register_method("Resource", MethodInfo::new("setup_local_to_scene"), |ctx| {
        ctx.call_virtual("_setup_local_to_scene", &[])?;
        if let Err(err) = ctx.emit_signal("setup_local_to_scene_requested", &[]) {
            log::error!("setup_local_to_scene: {err}");
        }
        Ok(())
    })?;

    db.register_signal("Resource", "changed")?;
    db.register_signal("Resource", "setup_local_to_scene_requested")?;
    Ok(())
}

// ============================================================================
// Node
// ============================================================================

fn register_node(db: &ClassDb) -> Result<(), RegistrationError> {
    db.register_class(ClassInfo::new("Node").inherits("Object"))?;

    db.register_method(
        "Node",
        MethodInfo::new("set_name").arg("name", VariantType::StringName),
        |ctx| {
            let name: StringName = ctx.arg(0)?;
            ctx.db().set_node_name(ctx.instance()?, name);
            if let Err(err) = ctx.emit_signal("renamed", &[]) {
                log::error!("set_name: {err}");
            }
            Ok(())
        },
    )?;

    db.register_method("Node", MethodInfo::new("get_name").returns(VariantType::StringName), |ctx| {
        let name = ctx.db().node_name(ctx.instance()?).unwrap_or_default();
        ctx.set_return(name)
    })?;

    db.register_method(
        "Node",
        MethodInfo::new("add_child")
            .arg("node", VariantType::Object)
            .arg("force_readable_name", VariantType::Bool)
            .arg("internal", VariantType::Int)
            .default_arg(Variant::Bool(false))
            .default_arg(Variant::Int(0)),
        |ctx| {
            let child = object_arg(ctx, 0, "Node")?;
            let parent = ctx.instance()?;
            if let Err(err) = ctx.db().add_child(parent, child) {
                log::error!("add_child {child} to {parent}: {err}");
            }
            Ok(())
        },
    )?;

    db.register_method(
        "Node",
        MethodInfo::new("remove_child").arg("node", VariantType::Object),
        |ctx| {
            let child = object_arg(ctx, 0, "Node")?;
            let parent = ctx.instance()?;
            if let Err(err) = ctx.db().remove_child(parent, child) {
                log::error!("remove_child {child} from {parent}: {err}");
            }
            Ok(())
        },
    )?;

    db.register_method(
        "Node",
        MethodInfo::new("get_child_count")
            .arg("include_internal", VariantType::Bool)
            .default_arg(Variant::Bool(false))
            .returns(VariantType::Int),
        |ctx| {
            let count = ctx.db().children(ctx.instance()?).len();
            ctx.set_return(count as i64)
        },
    )?;

    db.register_method(
        "Node",
        MethodInfo::new("get_child")
            .arg("idx", VariantType::Int)
            .arg("include_internal", VariantType::Bool)
            .default_arg(Variant::Bool(false))
            .returns(VariantType::Object),
        |ctx| {
            let index: i64 = ctx.arg(0)?;
            let child = ctx.db().get_child(ctx.instance()?, index);
            ctx.set_return(child)
        },
    )?;

    db.register_method("Node", MethodInfo::new("get_parent").returns(VariantType::Object), |ctx| {
        let parent = ctx.db().get_parent(ctx.instance()?);
        ctx.set_return(parent)
    })?;

    db.register_method("Node", MethodInfo::new("queue_free"), |ctx| {
        ctx.db().queue_free(ctx.instance()?);
        Ok(())
    })?;

    db.register_property(
        "Node",
        PropertyInfo::new("name", VariantType::StringName)
            .setter("set_name")
            .getter("get_name"),
    )?;

    for signal in [
        "ready",
        "tree_entered",
        "tree_exiting",
        "tree_exited",
        "child_entered_tree",
        "renamed",
    ] {
        db.register_signal("Node", signal)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> ClassDb {
        ClassDb::with_core_classes().unwrap()
    }

    fn call(db: &ClassDb, id: ObjectId, method: &str, args: &[Variant]) -> Variant {
        db.call_method(id, &StringName::new(method), args).unwrap()
    }

    #[test]
    fn core_hierarchy() {
        let db = db();
        assert!(db.inherits("Resource", "RefCounted"));
        assert!(db.inherits("Resource", "Object"));
        assert!(db.inherits("Node", "Object"));
        assert!(!db.inherits("Node", "RefCounted"));
    }

    #[test]
    fn object_introspection() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        assert_eq!(call(&db, node, "get_class", &[]), Variant::String("Node".into()));
        assert_eq!(call(&db, node, "is_class", &[Variant::String("Object".into())]), Variant::Bool(true));
        assert_eq!(call(&db, node, "get_instance_id", &[]), Variant::Int(node.raw() as i64));
        assert_eq!(
            call(&db, node, "has_method", &[Variant::StringName("add_child".into())]),
            Variant::Bool(true)
        );
        assert_eq!(
            call(&db, node, "has_signal", &[Variant::StringName("ready".into())]),
            Variant::Bool(true)
        );
    }

    #[test]
    fn to_string_without_script() {
        let db = db();
        let object = db.instantiate("Object").unwrap();
        assert_eq!(
            call(&db, object, "to_string", &[]),
            Variant::String(format!("<Object#{object}>"))
        );
    }

    #[test]
    fn reference_counting_natives() {
        let db = db();
        let resource = db.instantiate("Resource").unwrap();
        assert_eq!(call(&db, resource, "init_ref", &[]), Variant::Bool(true));
        assert_eq!(call(&db, resource, "reference", &[]), Variant::Bool(true));
        assert_eq!(call(&db, resource, "get_reference_count", &[]), Variant::Int(2));
        assert_eq!(call(&db, resource, "unreference", &[]), Variant::Bool(false));
        assert_eq!(call(&db, resource, "unreference", &[]), Variant::Bool(true));
    }

    #[test]
    fn resource_name_property() {
        let db = db();
        let resource = db.instantiate("Resource").unwrap();
        call(&db, resource, "set_name", &[Variant::String("grass".into())]);
        assert_eq!(call(&db, resource, "get_name", &[]), Variant::String("grass".into()));
        assert_eq!(
            db.get_property(resource, &StringName::new("resource_name")).unwrap(),
            Some(Variant::String("grass".into()))
        );
        assert_eq!(call(&db, resource, "get_path", &[]), Variant::String(String::new()));
    }

    #[test]
    fn node_children() {
        let db = db();
        let parent = db.instantiate("Node").unwrap();
        let a = db.instantiate("Node").unwrap();
        let b = db.instantiate("Node").unwrap();
        call(&db, parent, "add_child", &[Variant::Object(Some(a))]);
        call(&db, parent, "add_child", &[Variant::Object(Some(b))]);

        assert_eq!(call(&db, parent, "get_child_count", &[]), Variant::Int(2));
        assert_eq!(call(&db, parent, "get_child", &[Variant::Int(-1)]), Variant::Object(Some(b)));
        assert_eq!(call(&db, a, "get_parent", &[]), Variant::Object(Some(parent)));

        call(&db, parent, "remove_child", &[Variant::Object(Some(a))]);
        assert_eq!(call(&db, parent, "get_child_count", &[]), Variant::Int(1));
        assert_eq!(call(&db, a, "get_parent", &[]), Variant::Object(None));
    }

    #[test]
    fn add_child_rejects_null() {
        let db = db();
        let parent = db.instantiate("Node").unwrap();
        let err = db
            .call_method(parent, &StringName::new("add_child"), &[Variant::Object(None)])
            .unwrap_err();
        assert!(matches!(err, CallError::InvalidArgument { index: 0, .. }));
    }

    #[test]
    fn queue_free_waits_for_flush() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        call(&db, node, "queue_free", &[]);
        assert!(db.is_alive(node));
        assert_eq!(db.flush_deferred(), 1);
        assert!(!db.is_alive(node));
    }

    #[test]
    fn emit_signal_reports_status_codes() {
        let db = db();
        let node = db.instantiate("Node").unwrap();
        assert_eq!(
            call(&db, node, "emit_signal", &[Variant::StringName("ready".into())]),
            Variant::Int(EngineError::OK)
        );
        assert_eq!(
            call(&db, node, "emit_signal", &[Variant::StringName("missing".into())]),
            Variant::Int(EngineError::Unavailable.code())
        );
    }
}
