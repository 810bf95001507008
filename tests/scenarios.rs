use graphql_cache_patch::{
    analyze,
    ast::ASTContext,
    config::Config,
    documents::DocumentSet,
    error::{Error, ErrorType, Result},
    json::{patch_from_json, render_artifacts, ToJson},
    patch::ArtifactSet,
    schema::Schema,
};
use indoc::indoc;
use serde_json::json;

const SCHEMA: &str = indoc! {"
    type Query {
        user: User
        users: [User!]!
    }

    type Mutation {
        updateUser: User
        addFriend: AddFriendPayload
        removeFriend: AddFriendPayload
        deleteUser: DeleteUserPayload
    }

    type User {
        id: ID!
        firstName: String
        lastName: String
        friends(online: Boolean): [User!]!
    }

    type AddFriendPayload {
        friend: User
    }

    type DeleteUserPayload {
        userID: ID!
    }
"};

fn run(source: &str) -> Result<ArtifactSet> {
    run_with(source, &Config::default())
}

fn run_with(source: &str, config: &Config) -> Result<ArtifactSet> {
    run_files(&[("app.graphql", source)], config)
}

fn run_files(files: &[(&str, &str)], config: &Config) -> Result<ArtifactSet> {
    let ctx = ASTContext::new();
    let schema = Schema::parse(&ctx, SCHEMA)?;
    let mut documents = DocumentSet::new();
    for (filename, source) in files.iter() {
        documents.add_source(&ctx, filename, *source)?;
    }
    analyze(&ctx, schema, &documents, config)
}

fn messages(err: &Error) -> Vec<&str> {
    err.errors().iter().map(Error::message).collect()
}

#[test]
fn unrelated_fields_yield_empty_patch() {
    let artifacts = run(indoc! {"
        query Friends { user { friends { id } } }
        mutation Rename { updateUser { id firstName } }
    "})
    .unwrap();
    assert!(artifacts.patch("Friends", "Rename").is_none());
    assert_eq!(
        artifacts.patch_tree("Friends", "Rename").to_json().unwrap(),
        json!({})
    );
    assert!(artifacts.is_empty());
}

#[test]
fn shared_fields_are_patched() {
    let artifacts = run(indoc! {"
        query User { user { id firstName } }
        mutation Rename { updateUser { id firstName } }
    "})
    .unwrap();
    assert_eq!(
        artifacts.patch_tree("User", "Rename").to_json().unwrap(),
        json!({ "edges": { "updateUser": { "fields": { "firstName": [["user", "firstName"]] } } } })
    );
}

#[test]
fn inserts_into_connections() {
    let artifacts = run(indoc! {r#"
        query Friends {
            user {
                friends @connection(name: "Friends") {
                    id
                    firstName
                }
            }
        }

        mutation AddFriend {
            addFriend {
                friend {
                    ...Friends_insert @append(parentID: "1234")
                }
            }
        }
    "#})
    .unwrap();
    let patch = artifacts.patch_tree("Friends", "AddFriend").to_json().unwrap();
    assert_eq!(
        patch["edges"]["addFriend"]["edges"]["friend"]["operations"],
        json!({
            "add": [{
                "parentID": { "kind": "String", "value": "1234" },
                "position": "end",
                "path": ["user", "friends"],
                "connectionName": "Friends"
            }]
        })
    );
    assert_eq!(
        patch["edges"]["addFriend"]["edges"]["friend"]["fields"],
        json!({ "firstName": [["user", "friends", "firstName"]] })
    );
}

#[test]
fn duplicate_connection_names() {
    let err = run_files(
        &[
            ("a.graphql", r#"query A { user { friends @connection(name: "X") { id } } }"#),
            ("b.graphql", r#"query B { users @connection(name: "X") { id } }"#),
            ("rename.graphql", "mutation Rename { updateUser { id firstName } }"),
        ],
        &Config::default(),
    )
    .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Validation);
    assert_eq!(err.errors().len(), 1);
    assert_eq!(err.errors()[0].error_type(), ErrorType::Policy);
    assert_eq!(
        messages(&err),
        ["Connection name X is declared in both A (a.graphql) and B (b.graphql)"]
    );
}

#[test]
fn queries_and_fragments_share_names() {
    let err = run(indoc! {"
        query User { user { id firstName } }
        fragment User on User { id firstName }
        mutation Rename { updateUser { id firstName } }
    "})
    .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Structural);
    assert_eq!(
        err.message(),
        "The query User in app.graphql and the fragment User in app.graphql would share patch artifacts"
    );
}

#[test]
fn findings_of_every_phase_are_reported_together() {
    let err = run(indoc! {r#"
        query Users { users { id friends(online: true) @connection(name: "Friends") { id } } }
        mutation AddFriend { addFriend { friend { ...Friends_insert } } }
        mutation RemoveFriend {
            removeFriend { friend { ...Friends_remove @parentID(value: "1") @when(online: "yes") } }
        }
    "#})
    .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Validation);
    assert_eq!(
        messages(&err),
        [
            "Connection Friends needs a parent id where AddFriend spreads Friends_insert",
            "Condition online on connection Friends in RemoveFriend doesn't match its type Boolean",
        ]
    );
    assert!(err
        .errors()
        .iter()
        .all(|error| error.error_type() == ErrorType::Policy));
}

#[test]
fn rejected_connections_are_reported_before_their_spreads() {
    let err = run(indoc! {"
        query Friends { user { friends @connection { id } } }
        mutation AddFriend { addFriend { friend { ...Friends_insert } } }
    "})
    .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Validation);
    assert_eq!(
        messages(&err),
        ["@connection on user.friends in Friends needs a string `name` argument"]
    );
}

#[test]
fn fragment_connections_need_parent_ids() {
    let err = run(indoc! {r#"
        fragment UserFriends on User {
            friends @connection(name: "Friends") { id }
        }

        mutation AddFriend {
            addFriend { friend { ...Friends_insert } }
        }
    "#})
    .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Validation);
    assert_eq!(err.errors()[0].error_type(), ErrorType::Policy);
    assert_eq!(
        err.errors()[0].message(),
        "Connection Friends needs a parent id where AddFriend spreads Friends_insert"
    );
}

#[test]
fn non_null_lists_need_parent_ids() {
    let source = indoc! {r#"
        query Users { users { id friends @connection(name: "Friends") { id } } }
        mutation AddFriend { addFriend { friend { ...Friends_insert @prepend } } }
    "#};
    let err = run(source).unwrap_err();
    assert_eq!(err.errors()[0].error_type(), ErrorType::Policy);

    let artifacts = run(&source.replace("@prepend", "@prepend(parentID: $userID)")).unwrap();
    let patch = artifacts.patch_tree("Users", "AddFriend").to_json().unwrap();
    assert_eq!(
        patch["edges"]["addFriend"]["edges"]["friend"]["operations"]["add"],
        json!([{
            "parentID": { "kind": "Variable", "value": "userID" },
            "position": "start",
            "path": ["users", "friends"],
            "connectionName": "Friends"
        }])
    );
}

#[test]
fn removes_and_deletes() {
    let artifacts = run(indoc! {r#"
        query Friends { user { friends(online: true) @connection(name: "Friends") { id } } }
        mutation RemoveFriend { removeFriend { friend { ...Friends_remove @when(online: true) } } }
        mutation DeleteUser { deleteUser { userID @User_delete } }
    "#})
    .unwrap();
    assert_eq!(
        artifacts.patch_tree("Friends", "RemoveFriend").to_json().unwrap(),
        json!({ "edges": { "removeFriend": { "edges": { "friend": { "operations": { "remove": [{
            "parentID": { "kind": "Root" },
            "path": ["user", "friends"],
            "when": { "must": { "online": true } },
            "connectionName": "Friends"
        }] } } } } } })
    );
    assert_eq!(
        artifacts.patch_tree("Friends", "DeleteUser").to_json().unwrap(),
        json!({ "edges": { "deleteUser": { "edges": { "userID": { "operations": { "delete": [{
            "path": ["user", "friends"],
            "type": "User"
        }] } } } } } })
    );
}

#[test]
fn fragments_are_patched_and_linked() {
    let artifacts = run(indoc! {"
        fragment UserName on User { id firstName lastName }
        query User { user { ...UserName } }
        query Users { users { id lastName } }
        mutation Rename { updateUser { id firstName } }
    "})
    .unwrap();
    assert_eq!(
        artifacts.patch_tree("UserName", "Rename").to_json().unwrap(),
        json!({ "edges": { "updateUser": { "fields": { "firstName": [["firstName"]] } } } })
    );
    assert_eq!(
        artifacts.patch_tree("User", "Rename").to_json().unwrap(),
        json!({ "edges": { "updateUser": { "fields": { "firstName": [["user", "firstName"]] } } } })
    );
    assert!(artifacts.patch("Users", "Rename").is_none());
    assert_eq!(
        artifacts.link("Rename").unwrap().to_json().unwrap(),
        json!({
            "User": "../patches/User_Rename.json",
            "UserName": "../patches/UserName_Rename.json"
        })
    );
}

#[test]
fn mutations_never_target_themselves() {
    let artifacts = run(indoc! {"
        query User { user { id firstName } }
        mutation Rename { updateUser { id firstName } }
        mutation RenameAgain { updateUser { id firstName lastName } }
    "})
    .unwrap();
    for artifact in artifacts.patches.iter() {
        assert_eq!(artifact.query, "User");
    }
    assert_eq!(artifacts.patches.len(), 2);
}

#[test]
fn aliased_identity_fields_are_rejected() {
    let err = run(indoc! {"
        query User { user { id: firstName } }
        mutation Rename { updateUser { id firstName } }
    "})
    .unwrap_err();
    assert_eq!(err.errors()[0].error_type(), ErrorType::AliasConflict);
}

#[test]
fn artifacts_round_trip() {
    let artifacts = run(indoc! {r#"
        query Friends { user { id firstName friends @connection(name: "Friends") { id firstName } } }
        mutation AddFriend { addFriend { friend { ...Friends_insert @prepend } } }
        mutation Rename { updateUser { id firstName } }
    "#})
    .unwrap();
    let rendered = render_artifacts(&artifacts).unwrap();
    assert_eq!(rendered.len(), artifacts.patches.len() + artifacts.links.len());
    for (artifact, (path, contents)) in artifacts.patches.iter().zip(rendered.iter()) {
        assert_eq!(&artifact.path, path);
        assert_eq!(patch_from_json(contents).unwrap(), artifact.patch);
    }
}

#[test]
fn configured_names() {
    let config = Config::from_json(r#"{ "insertSuffix": "_add", "patchDirectory": "out" }"#).unwrap();
    let artifacts = run_with(
        indoc! {r#"
            query Friends { user { friends @connection(name: "Friends") { id } } }
            mutation AddFriend { addFriend { friend { ...Friends_add } } }
        "#},
        &config,
    )
    .unwrap();
    let artifact = artifacts.patch("Friends", "AddFriend").unwrap();
    assert_eq!(artifact.path, "out/Friends_AddFriend.json");
    assert_eq!(
        artifact.to_json().unwrap()["edges"]["addFriend"]["edges"]["friend"]["operations"]["add"][0]
            ["position"],
        json!("end")
    );
}
