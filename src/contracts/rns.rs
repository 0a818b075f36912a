use ethers::prelude::abigen;

abigen!(
    RnsRegistry,
    r#"[
        function resolver(bytes32 node) external view returns (address)
    ]"#
);

abigen!(
    RnsNameResolver,
    r#"[
        function name(bytes32 node) external view returns (string)
    ]"#
);
